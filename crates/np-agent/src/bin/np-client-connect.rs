//! OpenVPN `client-connect` hook. Exit 0 accepts the client, 1 rejects it.
//!
//! Requires `script-security 2` in the OpenVPN server config.

use std::process::ExitCode;

use np_agent::hooks::{ConnectEvent, HookClient};
use np_agent::startup;
use np_agent::transport::HttpTransport;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // OpenVPN copies hook stdout into its own log.
    let startup = match startup::bootstrap("np-client-connect", None, true) {
        Ok(startup) => startup,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let event = match ConnectEvent::from_env() {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "bad client-connect environment");
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

    match client.authorize(&event).await {
        Ok(decision) => ExitCode::from(decision.exit_code()),
        Err(e) => {
            error!(common_name = %event.common_name, error = %e, "authorization failed");
            ExitCode::FAILURE
        }
    }
}
