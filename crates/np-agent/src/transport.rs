use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use np_core::config::ApiConfig;

/// A completed HTTP exchange, whatever its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Connection and timeout failures are worth retrying; anything else
    /// will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

/// Form-encoded POST to the control API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<Reply, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<Reply, TransportError> {
        (**self).post_form(url, form).await
    }
}

/// `reqwest`-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(concat!("node-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(error_chain(&e)))?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, TransportError> {
        Self::new(Duration::from_millis(api.request_timeout_ms), api.verify_tls)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(error_chain(&err))
        } else {
            TransportError::Other(error_chain(&err))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<Reply, TransportError> {
        let resp = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.classify(e))?;
        Ok(Reply { status, body })
    }
}

/// `reqwest` hides the interesting part (refused, DNS, TLS) in the source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Join a base URL and a path without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
