//! node-pulse agent: one heartbeat per invocation, run from cron.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use np_agent::agent::{Agent, AgentError};
use np_agent::heartbeat::HeartbeatClient;
use np_agent::startup::{self, Startup};
use np_checks::CheckRegistry;
use np_metrics::MetricsCollector;
use tracing::{error, info};

/// Report this VPN node's health and load to the control API.
#[derive(Parser)]
#[command(name = "np-agent", version, about)]
struct Cli {
    /// Echo the sent payload and the API's reply.
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to $NODE_PULSE_CONFIG or /etc/node-pulse/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Build and log the report without sending it.
    #[arg(long, conflicts_with = "checks")]
    dry_run: bool,

    /// Only run the self-checks and print their results.
    #[arg(long)]
    checks: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Startup { config, identity } =
        match startup::bootstrap("np-agent", cli.config.as_deref(), cli.verbose) {
            Ok(startup) => startup,
            Err(e) => {
                error!("{e:#}");
                return ExitCode::FAILURE;
            }
        };

    let registry = match CheckRegistry::standard(&config) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "failed to build self-checks");
            return ExitCode::FAILURE;
        }
    };

    if cli.checks {
        return run_checks(&registry);
    }

    let client = match HeartbeatClient::from_config(&config.api) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let collector = MetricsCollector::from_config(&config, registry);
    let mut agent = Agent::new(collector, client, identity, cli.verbose);

    match run(&mut agent, cli.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(agent_err) = e.downcast_ref::<AgentError>() {
                if agent_err.is_fatal() {
                    error!("Giving up: {e:#}");
                    return ExitCode::FAILURE;
                }
            }
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(agent: &mut Agent, dry_run: bool) -> Result<()> {
    if dry_run {
        let report = agent.build_report().await.context("building report")?;
        info!("DRY RUN: {}", report.redacted());
        println!("{}", report.redacted());
        return Ok(());
    }
    agent.run_once().await?;
    Ok(())
}

fn run_checks(registry: &CheckRegistry) -> ExitCode {
    let results = registry.run_all();
    for result in &results {
        let verdict = if result.passed() { "ok" } else { "FAIL" };
        match result.message() {
            Some(msg) => println!("{:<20} {verdict:<4} {msg}", result.name()),
            None => println!("{:<20} {verdict}", result.name()),
        }
    }
    if results.iter().all(|r| r.passed()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
