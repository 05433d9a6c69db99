use np_core::config::NodeIdentity;
use np_core::types::{HeartbeatReport, HeartbeatResponse};
use np_metrics::{MetricsCollector, MetricsError};
use tracing::{error, info};

use crate::heartbeat::{HeartbeatClient, HeartbeatError};
use crate::transport::{HttpTransport, Transport};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("collecting metrics: {0}")]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Heartbeat(#[from] HeartbeatError),
}

impl AgentError {
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Heartbeat(e) => e.is_fatal(),
            Self::Metrics(_) => false,
        }
    }
}

/// What came back from one delivered heartbeat.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Delivered(HeartbeatResponse),
    /// The API answered but flagged the report. Not retried.
    ApiError {
        error: String,
        response: HeartbeatResponse,
    },
}

/// One scheduled run: snapshot, stamp with identity, deliver, log.
pub struct Agent<T = HttpTransport> {
    collector: MetricsCollector,
    client: HeartbeatClient<T>,
    identity: NodeIdentity,
    verbose: bool,
}

impl<T: Transport> Agent<T> {
    pub fn new(
        collector: MetricsCollector,
        client: HeartbeatClient<T>,
        identity: NodeIdentity,
        verbose: bool,
    ) -> Self {
        Self {
            collector,
            client,
            identity,
            verbose,
        }
    }

    /// Sample metrics (self-checks included) and attach the node identity.
    pub async fn build_report(&mut self) -> Result<HeartbeatReport, AgentError> {
        let snapshot = self.collector.snapshot().await?;
        Ok(HeartbeatReport::new(snapshot, &self.identity))
    }

    pub async fn run_once(&mut self) -> Result<RunOutcome, AgentError> {
        let report = self.build_report().await?;
        if self.verbose {
            info!("SENT: {}", report.redacted());
        }

        let response = self.client.send(&report).await?;

        match response.error() {
            None => {
                if self.verbose {
                    info!("RECV: {}", response.body());
                }
                Ok(RunOutcome::Delivered(response))
            }
            Some(api_error) => {
                if !self.verbose {
                    error!("SENT: {}", report.redacted());
                }
                error!("ERROR: {}", response.body());
                Ok(RunOutcome::ApiError {
                    error: api_error,
                    response,
                })
            }
        }
    }
}
