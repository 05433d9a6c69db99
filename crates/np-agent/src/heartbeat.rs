use std::time::Duration;

use np_core::config::ApiConfig;
use np_core::types::{ApiResponse, HeartbeatReport, HeartbeatResponse};
use tracing::{debug, error, warn};

use crate::transport::{endpoint, HttpTransport, Reply, Transport, TransportError};

/// Fixed-backoff retry budget for transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            attempts: api.attempts.max(1),
            backoff: Duration::from_secs(api.retry_backoff_secs),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    /// Every attempt failed at the transport level. The process must exit
    /// non-zero so the scheduler and the control API both notice.
    #[error("control API unreachable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: TransportError },
    #[error("heartbeat request failed: {0}")]
    Request(TransportError),
    #[error("control API answered HTTP {status} with a non-JSON body: {detail}")]
    InvalidResponse { status: u16, detail: String },
}

impl HeartbeatError {
    /// Whether delivery was abandoned after exhausting retries.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Delivers heartbeats to `POST {base_url}/nodes/{name}`.
pub struct HeartbeatClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
}

impl HeartbeatClient<HttpTransport> {
    pub fn from_config(api: &ApiConfig) -> Result<Self, TransportError> {
        Ok(Self::new(
            HttpTransport::from_config(api)?,
            &api.base_url,
            RetryPolicy::from_config(api),
        ))
    }
}

impl<T: Transport> HeartbeatClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            policy,
        }
    }

    pub fn node_url(&self, node_name: &str) -> String {
        endpoint(&self.base_url, &format!("nodes/{node_name}"))
    }

    /// Deliver one report.
    ///
    /// Transport failures are retried after a fixed backoff, up to the
    /// policy's attempt count. Any completed exchange returns its parsed
    /// body, including bodies carrying an application-level `error`.
    pub async fn send(&self, report: &HeartbeatReport) -> Result<HeartbeatResponse, HeartbeatError> {
        let url = self.node_url(&report.name);
        let form = report.form_fields();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transport.post_form(&url, &form).await {
                Ok(reply) => return parse_reply(reply),
                Err(e) if e.is_transient() => {
                    if attempt >= self.policy.attempts {
                        error!(attempts = attempt, error = %e, "Giving up on control API");
                        return Err(HeartbeatError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    warn!(
                        attempt,
                        error = %e,
                        "Retrying API in {} secs",
                        self.policy.backoff.as_secs()
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => return Err(HeartbeatError::Request(e)),
            }
        }
    }
}

fn parse_reply(reply: Reply) -> Result<HeartbeatResponse, HeartbeatError> {
    debug!(status = reply.status, bytes = reply.body.len(), "control API replied");
    serde_json::from_str(&reply.body)
        .map(ApiResponse)
        .map_err(|e| HeartbeatError::InvalidResponse {
            status: reply.status,
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_config() {
        let mut api = ApiConfig::default();
        assert_eq!(RetryPolicy::from_config(&api), RetryPolicy::default());
        api.attempts = 0;
        api.retry_backoff_secs = 5;
        let policy = RetryPolicy::from_config(&api);
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.backoff, Duration::from_secs(5));
    }

    #[test]
    fn only_exhaustion_is_fatal() {
        let exhausted = HeartbeatError::Exhausted {
            attempts: 3,
            last: TransportError::Connect("refused".into()),
        };
        assert!(exhausted.is_fatal());
        assert!(!HeartbeatError::Request(TransportError::Other("x".into())).is_fatal());
        assert!(!HeartbeatError::InvalidResponse {
            status: 502,
            detail: "expected value".into()
        }
        .is_fatal());
    }

    #[test]
    fn non_json_body_is_invalid_response() {
        let err = parse_reply(Reply {
            status: 502,
            body: "<html>Bad Gateway</html>".into(),
        })
        .unwrap_err();
        assert!(matches!(err, HeartbeatError::InvalidResponse { status: 502, .. }));
    }

    #[test]
    fn node_url_uses_name() {
        let client = HeartbeatClient::new(
            HttpTransport::new(Duration::from_secs(1), true).unwrap(),
            "https://api.lokun.is/",
            RetryPolicy::default(),
        );
        assert_eq!(client.node_url("vpn3"), "https://api.lokun.is/nodes/vpn3");
    }
}
