use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use np_core::types::CheckResult;

use crate::registry::Probe;

const NAME: &str = "StatusFiles";

/// OpenVPN rewrites its status file every few seconds; one that is missing or
/// older than `max_age` means the tunnel server is wedged.
#[derive(Debug, Clone)]
pub struct StatusFilesProbe {
    files: Vec<PathBuf>,
    max_age: Duration,
}

impl StatusFilesProbe {
    pub fn new(files: Vec<PathBuf>, max_age_secs: u64) -> Self {
        Self {
            files,
            max_age: i64::try_from(max_age_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Evaluate against an explicit `now`.
    pub fn check_at(&self, now: DateTime<Utc>) -> CheckResult {
        let errors: Vec<String> = self
            .files
            .iter()
            .filter_map(|path| self.file_error(path, now))
            .collect();
        if errors.is_empty() {
            CheckResult::pass(NAME)
        } else {
            CheckResult::fail(NAME, errors.join(", "))
        }
    }

    fn file_error(&self, path: &Path, now: DateTime<Utc>) -> Option<String> {
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(_) => return Some(format!("{} doesn't exist", path.display())),
        };
        let minutes = self.max_age.num_minutes();
        (now.signed_duration_since(modified) > self.max_age)
            .then(|| format!("{} hasn't been updated in {minutes} mins", path.display()))
    }
}

impl Probe for StatusFilesProbe {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> CheckResult {
        self.check_at(Utc::now())
    }
}
