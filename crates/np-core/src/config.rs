use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV: &str = "NODE_PULSE_CONFIG";

/// Top-level configuration loaded from `/etc/node-pulse/config.toml`.
///
/// **Security**: the shared secret is never stored here. `[identity]` only
/// names the files the secret and node name are read from, see
/// [`IdentityConfig::load`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub openvpn: OpenVpnConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from `$NODE_PULSE_CONFIG` or the default path, falling
    /// back to defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path. A missing file is an error here.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api.base_url must not be empty".into()));
        }
        if self.api.attempts == 0 {
            return Err(ConfigError::Validation("api.attempts must be at least 1".into()));
        }
        if self.openvpn.status_files.is_empty() {
            return Err(ConfigError::Validation(
                "openvpn.status_files must list at least one file".into(),
            ));
        }
        if self.checks.tmpfs_max_percent > 100 {
            return Err(ConfigError::Validation(format!(
                "checks.tmpfs_max_percent must be <= 100, got {}",
                self.checks.tmpfs_max_percent
            )));
        }
        regex::Regex::new(&self.openvpn.hook_pattern).map_err(|e| {
            ConfigError::Validation(format!("openvpn.hook_pattern is not a valid regex: {e}"))
        })?;
        Ok(())
    }

    fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/etc/node-pulse/config.toml"))
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub verify_tls: bool,
    /// Per-request timeout; the whole run has no timeout of its own.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            verify_tls: false,
            request_timeout_ms: default_request_timeout_ms(),
            attempts: default_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.lokun.is".into()
}
fn default_request_timeout_ms() -> u64 {
    4200
}
fn default_attempts() -> u32 {
    3
}
fn default_retry_backoff_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_secret_file")]
    pub secret_file: PathBuf,
    #[serde(default = "default_node_name_file")]
    pub node_name_file: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            secret_file: default_secret_file(),
            node_name_file: default_node_name_file(),
        }
    }
}

impl IdentityConfig {
    /// Read the shared secret and node name, trimming surrounding whitespace.
    pub fn load(&self) -> Result<NodeIdentity, ConfigError> {
        let secret = read_trimmed(&self.secret_file)?;
        let name = read_trimmed(&self.node_name_file)?;
        if name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "node name file {} is empty",
                self.node_name_file.display()
            )));
        }
        Ok(NodeIdentity { secret, name })
    }
}

fn read_trimmed(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))
}

fn default_secret_file() -> PathBuf {
    PathBuf::from("/etc/openvpn/keyfile.txt")
}
fn default_node_name_file() -> PathBuf {
    PathBuf::from("/etc/openvpn/servername.txt")
}

/// The node's identity towards the control API.
#[derive(Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub secret: String,
    pub name: String,
}

impl std::fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("secret", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenVpnConfig {
    #[serde(default = "default_status_files")]
    pub status_files: Vec<PathBuf>,
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Matched against full command lines to find hung connect/disconnect hooks.
    #[serde(default = "default_hook_pattern")]
    pub hook_pattern: String,
}

impl Default for OpenVpnConfig {
    fn default() -> Self {
        Self {
            status_files: default_status_files(),
            process_name: default_process_name(),
            hook_pattern: default_hook_pattern(),
        }
    }
}

fn default_status_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/tmp/lokun/openvpn-status.log"),
        PathBuf::from("/tmp/lokun/openvpn-status-tcp.log"),
    ]
}
fn default_process_name() -> String {
    "openvpn".into()
}
fn default_hook_pattern() -> String {
    ".client-[cd]".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Directory the write probe creates its scratch file in.
    #[serde(default = "default_probe_dir")]
    pub probe_dir: PathBuf,
    #[serde(default = "default_tmpfs_mount")]
    pub tmpfs_mount: PathBuf,
    #[serde(default = "default_tmpfs_max_percent")]
    pub tmpfs_max_percent: u8,
    #[serde(default = "default_status_max_age_secs")]
    pub status_max_age_secs: u64,
    #[serde(default = "default_mounts_file")]
    pub mounts_file: PathBuf,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            probe_dir: default_probe_dir(),
            tmpfs_mount: default_tmpfs_mount(),
            tmpfs_max_percent: default_tmpfs_max_percent(),
            status_max_age_secs: default_status_max_age_secs(),
            mounts_file: default_mounts_file(),
        }
    }
}

fn default_probe_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_tmpfs_mount() -> PathBuf {
    PathBuf::from("/tmp/lokun")
}
fn default_tmpfs_max_percent() -> u8 {
    80
}
fn default_status_max_age_secs() -> u64 {
    600
}
fn default_mounts_file() -> PathBuf {
    PathBuf::from("/proc/mounts")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Pre-dumped accounting database. When unset, `vnstat --dumpdb` is run.
    #[serde(default)]
    pub accounting_dump: Option<PathBuf>,
    #[serde(default = "default_uptime_file")]
    pub uptime_file: PathBuf,
    #[serde(default = "default_net_stats_dir")]
    pub net_stats_dir: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            accounting_dump: None,
            uptime_file: default_uptime_file(),
            net_stats_dir: default_net_stats_dir(),
        }
    }
}

impl MetricsConfig {
    /// `/sys/class/net/<iface>/statistics/rx_bytes`
    pub fn rx_bytes_path(&self) -> PathBuf {
        self.net_stats_dir
            .join(&self.interface)
            .join("statistics")
            .join("rx_bytes")
    }
}

fn default_interface() -> String {
    "eth0".into()
}
fn default_uptime_file() -> PathBuf {
    PathBuf::from("/proc/uptime")
}
fn default_net_stats_dir() -> PathBuf {
    PathBuf::from("/sys/class/net")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Nodes that always write their full debug log to `file`.
    #[serde(default = "default_verbose_nodes")]
    pub verbose_nodes: Vec<String>,
    /// Console output format. The debug file is always plain text.
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            log_to_file: false,
            level: default_log_level(),
            verbose_nodes: default_verbose_nodes(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Whether every log line (not only warnings and errors) goes to `file`.
    pub fn full_file_log_for(&self, node_name: &str) -> bool {
        self.log_to_file || self.verbose_nodes.iter().any(|n| n == node_name)
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/lokun/debug.log")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_verbose_nodes() -> Vec<String> {
    vec!["vpn2".into(), "vpn00".into(), "testvpn".into()]
}
