//! OpenVPN `client-connect` / `client-disconnect` calls.
//!
//! OpenVPN passes session details through the environment and reads the
//! hook's exit status: `0` accepts the client, anything else rejects it.
//! Each hook makes a single request; a hung hook blocks the tunnel, so
//! there is no retry here.

use np_core::types::ApiResponse;
use serde_json::Value;
use tracing::{debug, info};

use crate::transport::{endpoint, HttpTransport, Transport, TransportError};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("environment variable {name} is not a byte count: {value:?}")]
    InvalidCount { name: &'static str, value: String },
    #[error("invalid common name {0:?}")]
    InvalidCommonName(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("control API answered HTTP {status} with a non-JSON body: {detail}")]
    InvalidResponse { status: u16, detail: String },
}

/// `client-connect` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectEvent {
    pub common_name: String,
}

impl ConnectEvent {
    pub fn from_env() -> Result<Self, HookError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HookError> {
        Ok(Self {
            common_name: common_name(&lookup)?,
        })
    }
}

/// `client-disconnect` input. Byte counts are from the server's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectEvent {
    pub common_name: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl DisconnectEvent {
    pub fn from_env() -> Result<Self, HookError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HookError> {
        Ok(Self {
            common_name: common_name(&lookup)?,
            bytes_sent: byte_count(&lookup, "bytes_sent")?,
            bytes_received: byte_count(&lookup, "bytes_received")?,
        })
    }

    /// Total session traffic, reported as `dl`.
    pub fn traffic(&self) -> u64 {
        self.bytes_sent.saturating_add(self.bytes_received)
    }
}

fn common_name(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, HookError> {
    let cn = lookup("common_name").ok_or(HookError::MissingVar("common_name"))?;
    // The name becomes a path segment.
    if cn.is_empty() || cn.contains(['/', '?', '#']) || cn.chars().any(char::is_whitespace) {
        return Err(HookError::InvalidCommonName(cn));
    }
    Ok(cn)
}

fn byte_count(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<u64, HookError> {
    let value = lookup(name).ok_or(HookError::MissingVar(name))?;
    value
        .trim()
        .parse()
        .map_err(|_| HookError::InvalidCount { name, value })
}

/// Outcome of a `client-connect` authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Accepted,
    Rejected { reason: String },
}

impl AuthDecision {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Accepted => 0,
            Self::Rejected { .. } => 1,
        }
    }
}

pub struct HookClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    secret: String,
}

impl<T: Transport> HookClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }

    /// Ask the control API whether `event.common_name` has an active
    /// subscription.
    pub async fn authorize(&self, event: &ConnectEvent) -> Result<AuthDecision, HookError> {
        let cn = &event.common_name;
        let url = endpoint(&self.base_url, &format!("vpn/{cn}/sub"));
        let reply = self
            .transport
            .post_form(&url, &[("secret", self.secret.clone())])
            .await?;
        let response = parse_json(reply.status, &reply.body)?;

        let decision = decide(&response);
        match &decision {
            AuthDecision::Accepted => info!(common_name = %cn, "{cn} authed"),
            AuthDecision::Rejected { reason } => {
                info!(common_name = %cn, %reason, "{cn} not authed")
            }
        }
        Ok(decision)
    }

    /// Report the session's traffic on disconnect.
    pub async fn report_traffic(&self, event: &DisconnectEvent) -> Result<(), HookError> {
        let cn = &event.common_name;
        let url = endpoint(&self.base_url, &format!("vpn/{cn}/report"));
        let form = [
            ("secret", self.secret.clone()),
            ("dl", event.traffic().to_string()),
        ];
        let reply = self.transport.post_form(&url, &form).await?;
        debug!(status = reply.status, "traffic report delivered");

        info!(
            common_name = %cn,
            "{cn} disconnect. {} mb",
            event.traffic() / MIB
        );
        info!(" in: {}", event.bytes_sent / MIB);
        info!(" out: {}", event.bytes_received / MIB);
        Ok(())
    }
}

fn parse_json(status: u16, body: &str) -> Result<ApiResponse, HookError> {
    serde_json::from_str(body)
        .map(ApiResponse)
        .map_err(|e| HookError::InvalidResponse {
            status,
            detail: e.to_string(),
        })
}

fn decide(response: &ApiResponse) -> AuthDecision {
    if let Some(error) = response.error() {
        return AuthDecision::Rejected {
            reason: format!("error: {error}"),
        };
    }
    match response.body().get("sub_status") {
        Some(Value::String(s)) if s == "True" => AuthDecision::Accepted,
        Some(other) => AuthDecision::Rejected {
            reason: format!("sub_status is {other}"),
        },
        None => AuthDecision::Rejected {
            reason: "sub_status missing".into(),
        },
    }
}
