use std::path::Path;

use crate::error::MetricsError;

const DAY: u64 = 86_400;
const HOUR: u64 = 3_600;

/// `"<days>d <hours>h"`, hours truncated to the current hour.
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let days = total / DAY;
    let hours = (total % DAY) / HOUR;
    format!("{days}d {hours}h")
}

/// Parse the first field of a `/proc/uptime` line.
pub fn parse_uptime(text: &str) -> Result<f64, MetricsError> {
    let field = text
        .split_whitespace()
        .next()
        .ok_or_else(|| MetricsError::parse("uptime", "empty file"))?;
    field
        .parse()
        .map_err(|e| MetricsError::parse("uptime", format!("{field:?}: {e}")))
}

pub fn read_uptime(path: &Path) -> Result<String, MetricsError> {
    let text = std::fs::read_to_string(path).map_err(|e| MetricsError::io(path, e))?;
    Ok(format_uptime(parse_uptime(&text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_a_day() {
        assert_eq!(format_uptime(0.0), "0d 0h");
        assert_eq!(format_uptime(3599.99), "0d 0h");
        assert_eq!(format_uptime(3600.0), "0d 1h");
        assert_eq!(format_uptime(86_399.0), "0d 23h");
    }

    #[test]
    fn days_and_truncated_hours() {
        assert_eq!(format_uptime(86_400.0), "1d 0h");
        // 3 days, 4 hours, 59 minutes
        assert_eq!(format_uptime((3 * DAY + 4 * HOUR + 59 * 60) as f64), "3d 4h");
        assert_eq!(format_uptime(1_000_000.5), "11d 13h");
    }

    #[test]
    fn proc_uptime_line() {
        assert_eq!(parse_uptime("350735.47 234388.90\n").unwrap(), 350735.47);
        assert!(parse_uptime("").is_err());
        assert!(parse_uptime("abc 1.0").is_err());
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime");
        std::fs::write(&path, "350735.47 234388.90\n").unwrap();
        assert_eq!(read_uptime(&path).unwrap(), "4d 1h");
    }
}
