//! Monthly traffic totals from a vnStat database dump.
//!
//! `vnstat --dumpdb` prints one semicolon-separated row per period; month
//! rows look like `m;0;1380578400;1032;2140;408;732;1`, where index 0 is the
//! current month and fields 3 and 4 are received and transmitted MiB.

use std::path::PathBuf;
use std::process::Command;

use crate::error::MetricsError;

const RX_MIB_FIELD: usize = 3;
const TX_MIB_FIELD: usize = 4;

/// Where the accounting dump comes from.
pub trait AccountingSource: Send {
    fn read_dump(&self) -> Result<String, MetricsError>;
}

/// A dump written to disk by an external job.
#[derive(Debug, Clone)]
pub struct DumpFile(pub PathBuf);

impl AccountingSource for DumpFile {
    fn read_dump(&self) -> Result<String, MetricsError> {
        std::fs::read_to_string(&self.0).map_err(|e| MetricsError::io(&self.0, e))
    }
}

/// Runs `vnstat --dumpdb -i <interface>`.
#[derive(Debug, Clone)]
pub struct VnstatCommand {
    pub interface: String,
}

impl AccountingSource for VnstatCommand {
    fn read_dump(&self) -> Result<String, MetricsError> {
        let command = format!("vnstat --dumpdb -i {}", self.interface);
        let output = Command::new("vnstat")
            .args(["--dumpdb", "-i", &self.interface])
            .output()
            .map_err(|e| MetricsError::Command {
                command: command.clone(),
                detail: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(MetricsError::Command {
                command,
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `(rx_mib, tx_mib)` of the current month row.
pub fn current_month_mib(dump: &str) -> Result<(u64, u64), MetricsError> {
    let row = dump
        .lines()
        .map(|line| line.trim().split(';').collect::<Vec<_>>())
        .find(|fields| fields.first() == Some(&"m") && fields.get(1) == Some(&"0"))
        .ok_or_else(|| MetricsError::parse("accounting dump", "no current month row (m;0)"))?;
    let field = |idx: usize, name: &str| -> Result<u64, MetricsError> {
        let raw = row.get(idx).ok_or_else(|| {
            MetricsError::parse("accounting dump", format!("month row has no {name} field"))
        })?;
        raw.parse().map_err(|e| {
            MetricsError::parse("accounting dump", format!("{name} {raw:?}: {e}"))
        })
    };
    Ok((field(RX_MIB_FIELD, "rx")?, field(TX_MIB_FIELD, "tx")?))
}

/// Binary MiB to decimal GB, truncating at each step:
/// `((rx + tx) << 20) / 1_000_000 / 1000`.
pub fn mib_to_gb(rx_mib: u64, tx_mib: u64) -> u64 {
    let bytes = rx_mib
        .saturating_add(tx_mib)
        .checked_mul(1 << 20)
        .unwrap_or(u64::MAX);
    bytes / 1_000_000 / 1000
}

/// Decimal GB transferred this month.
pub fn monthly_total_gb(source: &dyn AccountingSource) -> Result<u64, MetricsError> {
    let (rx, tx) = current_month_mib(&source.read_dump()?)?;
    Ok(mib_to_gb(rx, tx))
}
