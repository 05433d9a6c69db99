use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::NodeIdentity;

// ---------------------------------------------------------------------------
// Self-checks
// ---------------------------------------------------------------------------

/// Outcome of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    name: String,
    passed: bool,
    message: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Logical AND over a full evaluation pass, plus the failure messages in
/// evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub passed: bool,
    pub messages: Vec<String>,
}

impl AggregateResult {
    /// Fold results in order. Failures with an empty or absent message still
    /// flip `passed` but add nothing to `messages`.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a CheckResult>) -> Self {
        let mut passed = true;
        let mut messages = Vec::new();
        for result in results {
            if result.passed() {
                continue;
            }
            passed = false;
            if let Some(msg) = result.message().filter(|m| !m.is_empty()) {
                messages.push(msg.to_string());
            }
        }
        Self { passed, messages }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Point-in-time operational snapshot of the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Peak CPU utilisation over the sampling window, 0-100.
    pub cpu: f32,
    /// `"<days>d <hours>h"`
    pub uptime: String,
    /// Decimal GB transferred this month.
    pub total_throughput: u64,
    /// Mean bytes received per ~1s sampling window.
    pub throughput: u64,
    #[serde(rename = "selfcheck")]
    pub selfcheck_ok: bool,
    pub usercount: u64,
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// A snapshot stamped with the node's identity: the heartbeat wire payload.
#[derive(Clone, PartialEq)]
pub struct HeartbeatReport {
    pub snapshot: MetricsSnapshot,
    pub secret: String,
    pub name: String,
}

impl HeartbeatReport {
    pub fn new(snapshot: MetricsSnapshot, identity: &NodeIdentity) -> Self {
        Self {
            snapshot,
            secret: identity.secret.clone(),
            name: identity.name.clone(),
        }
    }

    /// Flattened form fields in wire order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let s = &self.snapshot;
        vec![
            ("cpu", s.cpu.to_string()),
            ("uptime", s.uptime.clone()),
            ("total_throughput", s.total_throughput.to_string()),
            ("throughput", s.throughput.to_string()),
            ("selfcheck", wire_bool(s.selfcheck_ok).to_string()),
            ("usercount", s.usercount.to_string()),
            ("secret", self.secret.clone()),
            ("name", self.name.clone()),
        ]
    }

    /// The payload as JSON with the secret masked, for log lines.
    pub fn redacted(&self) -> Value {
        let mut value = serde_json::to_value(&self.snapshot).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("name".into(), Value::String(self.name.clone()));
            map.insert("secret".into(), Value::String("<redacted>".into()));
        }
        value
    }
}

impl std::fmt::Debug for HeartbeatReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatReport")
            .field("snapshot", &self.snapshot)
            .field("secret", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// The control API expects capitalised booleans.
pub fn wire_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Parsed JSON reply from any control API endpoint. Callers interpret the
/// keys they care about; `error` means the API refused the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse(pub Value);

/// Reply to `POST /nodes/{name}`. Only the `error` key is interpreted.
pub type HeartbeatResponse = ApiResponse;

impl ApiResponse {
    /// The application-level error, if the API reported one.
    pub fn error(&self) -> Option<String> {
        match self.0.get("error")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn body(&self) -> &Value {
        &self.0
    }
}
