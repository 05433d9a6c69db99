use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// How a binary wants its log output routed.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Echo `level` and above to stdout instead of only warnings.
    pub verbose: bool,
    /// Level used for stdout in verbose mode and for a full file log.
    pub level: String,
    /// Debug log file. `None` disables the file sink entirely.
    pub file: Option<PathBuf>,
    /// Write everything at `level` to `file`, not only warnings and errors.
    pub full_file_log: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            level: "info".into(),
            file: None,
            full_file_log: false,
        }
    }
}

impl LogOptions {
    fn console_filter(&self) -> EnvFilter {
        let default_level = if self.verbose { self.level.as_str() } else { "warn" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }

    fn file_filter(&self) -> EnvFilter {
        if self.full_file_log {
            EnvFilter::new(&self.level)
        } else {
            EnvFilter::new("warn")
        }
    }
}

/// Initialize logging with human-readable output format.
///
/// Uses the `RUST_LOG` environment variable for the console if set. The
/// file sink ignores `RUST_LOG` so errors are never filtered out of it.
///
/// Safe to call multiple times (e.g. in tests) -- subsequent calls are no-ops.
pub fn init_logging(service_name: &str, opts: &LogOptions) {
    let console = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_filter(opts.console_filter());

    let file = opts.file.as_deref().and_then(open_log_file).map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .with_filter(opts.file_filter())
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .ok();

    tracing::debug!(service = service_name, "logging initialised (human-readable)");
}

/// Initialize logging with JSON output on stdout (suitable for Vector / Loki / ELK).
///
/// The file sink, when configured, stays human-readable.
///
/// Safe to call multiple times -- subsequent calls are no-ops.
pub fn init_logging_json(service_name: &str, opts: &LogOptions) {
    let console = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_filter(opts.console_filter());

    let file = opts.file.as_deref().and_then(open_log_file).map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .with_filter(opts.file_filter())
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .ok();

    tracing::debug!(service = service_name, "logging initialised (json)");
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            // No subscriber yet; stderr is all we have.
            eprintln!("cannot open debug log {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_log_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("debug.log");
        assert!(open_log_file(&path).is_some());
        assert!(path.exists());
    }

    #[test]
    fn open_log_file_in_unwritable_location_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        assert!(open_log_file(dir.path()).is_none());
    }
}
