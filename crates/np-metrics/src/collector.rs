use std::path::PathBuf;
use std::time::Duration;

use np_checks::CheckRegistry;
use np_core::config::Config;
use np_core::types::MetricsSnapshot;
use tracing::debug;

use crate::accounting::{self, AccountingSource, DumpFile, VnstatCommand};
use crate::cpu::{self, CpuSampler, SystemCpu};
use crate::error::MetricsError;
use crate::sessions;
use crate::throughput::{self, ByteCounter, SysfsCounter};
use crate::uptime;

/// Sample counts and window lengths for the time-windowed metrics.
#[derive(Debug, Clone)]
pub struct SamplingPlan {
    pub cpu_samples: usize,
    pub cpu_window: Duration,
    pub throughput_samples: u64,
    pub throughput_window: Duration,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            cpu_samples: 3,
            cpu_window: Duration::from_millis(500),
            throughput_samples: 3,
            throughput_window: Duration::from_secs(1),
        }
    }
}

/// The OS-facing inputs of a snapshot.
pub struct MetricSources {
    pub cpu: Box<dyn CpuSampler>,
    pub rx_counter: Box<dyn ByteCounter>,
    pub accounting: Box<dyn AccountingSource>,
    pub uptime_file: PathBuf,
    pub status_files: Vec<PathBuf>,
}

impl MetricSources {
    pub fn from_config(config: &Config) -> Self {
        let metrics = &config.metrics;
        let accounting: Box<dyn AccountingSource> = match &metrics.accounting_dump {
            Some(path) => Box::new(DumpFile(path.clone())),
            None => Box::new(VnstatCommand {
                interface: metrics.interface.clone(),
            }),
        };
        Self {
            cpu: Box::new(SystemCpu::new()),
            rx_counter: Box::new(SysfsCounter::new(metrics.rx_bytes_path())),
            accounting,
            uptime_file: metrics.uptime_file.clone(),
            status_files: config.openvpn.status_files.clone(),
        }
    }
}

/// Builds a fresh [`MetricsSnapshot`] per call. Nothing is cached between
/// calls.
pub struct MetricsCollector {
    registry: CheckRegistry,
    sources: MetricSources,
    plan: SamplingPlan,
}

impl MetricsCollector {
    pub fn new(registry: CheckRegistry, sources: MetricSources, plan: SamplingPlan) -> Self {
        Self {
            registry,
            sources,
            plan,
        }
    }

    pub fn from_config(config: &Config, registry: CheckRegistry) -> Self {
        Self::new(registry, MetricSources::from_config(config), SamplingPlan::default())
    }

    /// Sample every metric and run the self-checks.
    ///
    /// Sleeps for the full sampling plan (about 4.5s with the defaults).
    pub async fn snapshot(&mut self) -> Result<MetricsSnapshot, MetricsError> {
        let cpu = cpu::peak_cpu(
            self.sources.cpu.as_mut(),
            self.plan.cpu_samples,
            self.plan.cpu_window,
        )
        .await;
        debug!(cpu, "cpu sampled");

        let uptime = uptime::read_uptime(&self.sources.uptime_file)?;
        debug!(%uptime, "uptime read");

        let total_throughput = accounting::monthly_total_gb(self.sources.accounting.as_ref())?;
        debug!(total_throughput, "monthly total read");

        let throughput = throughput::mean_throughput(
            self.sources.rx_counter.as_ref(),
            self.plan.throughput_samples,
            self.plan.throughput_window,
        )
        .await?;
        debug!(throughput, "throughput sampled");

        let selfcheck_ok = self.registry.evaluate().passed;
        debug!(selfcheck_ok, "self-checks evaluated");

        let usercount = sessions::count_users(&self.sources.status_files)?;
        debug!(usercount, "sessions counted");

        Ok(MetricsSnapshot {
            cpu,
            uptime,
            total_throughput,
            throughput,
            selfcheck_ok,
            usercount,
        })
    }
}
