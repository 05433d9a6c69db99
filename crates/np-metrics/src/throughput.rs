use std::path::PathBuf;
use std::time::Duration;

use crate::error::MetricsError;

/// A monotonically increasing byte counter.
pub trait ByteCounter: Send {
    fn read(&self) -> Result<u64, MetricsError>;
}

/// `/sys/class/net/<iface>/statistics/rx_bytes`, re-read on every call.
#[derive(Debug, Clone)]
pub struct SysfsCounter {
    path: PathBuf,
}

impl SysfsCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ByteCounter for SysfsCounter {
    fn read(&self) -> Result<u64, MetricsError> {
        let raw =
            std::fs::read_to_string(&self.path).map_err(|e| MetricsError::io(&self.path, e))?;
        raw.trim()
            .parse()
            .map_err(|e| MetricsError::parse("byte counter", format!("{raw:?}: {e}")))
    }
}

/// Mean of `samples` before/after deltas, each pair `window` apart.
///
/// With a one second window the result approximates bytes per second. A
/// counter that goes backwards (interface reset) contributes zero.
pub async fn mean_throughput(
    counter: &dyn ByteCounter,
    samples: u64,
    window: Duration,
) -> Result<u64, MetricsError> {
    if samples == 0 {
        return Ok(0);
    }
    let mut total: u64 = 0;
    for _ in 0..samples {
        let start = counter.read()?;
        tokio::time::sleep(window).await;
        let end = counter.read()?;
        let delta = end.saturating_sub(start);
        tracing::trace!(delta, "throughput sample");
        total = total.saturating_add(delta);
    }
    Ok(total / samples)
}
