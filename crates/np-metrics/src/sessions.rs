//! Connected-user counting from OpenVPN status logs.

use std::path::PathBuf;

use crate::error::MetricsError;

/// First-field values that are status-log bookkeeping, not users.
/// `UNDEF` is a client that has not finished authenticating.
pub const EXCLUDED_NAMES: [&str; 3] = ["END", "Updated", "UNDEF"];

/// Whether a status-log line is an active session row.
pub fn is_session_line(line: &str) -> bool {
    if !line.contains(',') {
        return false;
    }
    let first = line.split(',').next().unwrap_or_default();
    !first.is_empty()
        && first.chars().all(|c| c.is_ascii_alphanumeric())
        && !EXCLUDED_NAMES.contains(&first)
}

pub fn count_sessions(status: &str) -> u64 {
    status.lines().filter(|l| is_session_line(l)).count() as u64
}

/// Sessions summed over every status file. An unreadable file is an error.
pub fn count_users(files: &[PathBuf]) -> Result<u64, MetricsError> {
    files.iter().try_fold(0u64, |total, path| {
        let text = std::fs::read_to_string(path).map_err(|e| MetricsError::io(path, e))?;
        Ok(total + count_sessions(&text))
    })
}
