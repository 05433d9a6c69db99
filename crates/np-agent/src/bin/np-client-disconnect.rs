//! OpenVPN `client-disconnect` hook: reports the session's traffic.

use std::process::ExitCode;

use np_agent::hooks::{DisconnectEvent, HookClient};
use np_agent::startup;
use np_agent::transport::HttpTransport;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // OpenVPN copies hook stdout into its own log.
    let startup = match startup::bootstrap("np-client-disconnect", None, true) {
        Ok(startup) => startup,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let event = match DisconnectEvent::from_env() {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "bad client-disconnect environment");
            return ExitCode::FAILURE;
        }
    };

    let transport = match HttpTransport::from_config(&startup.config.api) {
        Ok(transport) => transport,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let client = HookClient::new(
        transport,
        &startup.config.api.base_url,
        &startup.identity.secret,
    );

    match client.report_traffic(&event).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(common_name = %event.common_name, error = %e, "traffic report failed");
            ExitCode::FAILURE
        }
    }
}
