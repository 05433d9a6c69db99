use std::path::Path;

use anyhow::{Context, Result};
use np_core::config::{Config, ConfigError, LogFormat, NodeIdentity};
use np_telemetry::logging::{init_logging, init_logging_json, LogOptions};

/// Everything a binary needs before it can do its job.
#[derive(Debug)]
pub struct Startup {
    pub config: Config,
    pub identity: NodeIdentity,
}

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Log routing for a node. `node_name` is `None` when the identity files
/// could not be read; the file sink still receives warnings then.
pub fn log_options(config: &Config, node_name: Option<&str>, verbose: bool) -> LogOptions {
    let logging = &config.logging;
    LogOptions {
        verbose,
        level: logging.level.clone(),
        file: Some(logging.file.clone()),
        full_file_log: node_name.is_some_and(|n| logging.full_file_log_for(n)),
    }
}

fn install_logging(service: &str, format: LogFormat, opts: &LogOptions) {
    match format {
        LogFormat::Text => init_logging(service, opts),
        LogFormat::Json => init_logging_json(service, opts),
    }
}

/// Load config and identity, then install logging.
///
/// Logging comes up even when loading fails so the error reaches stdout or
/// the debug file before the process exits.
pub fn bootstrap(service: &str, config_path: Option<&Path>, verbose: bool) -> Result<Startup> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            init_logging(
                service,
                &LogOptions {
                    verbose,
                    ..LogOptions::default()
                },
            );
            return Err(e).context("loading configuration");
        }
    };

    let identity = config.identity.load();
    let node_name = identity.as_ref().ok().map(|id| id.name.as_str());
    install_logging(
        service,
        config.logging.format,
        &log_options(&config, node_name, verbose),
    );

    let identity = identity.context("loading node identity")?;
    tracing::debug!(node = %identity.name, api = %config.api.base_url, "startup complete");
    Ok(Startup { config, identity })
}
