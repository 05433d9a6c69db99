use std::time::Duration;

use sysinfo::System;

/// Measures CPU utilisation over a window the caller controls.
pub trait CpuSampler: Send {
    /// Mark the start of a measurement window.
    fn begin(&mut self);

    /// Utilisation in percent since the matching `begin`.
    fn finish(&mut self) -> f32;
}

/// Host-wide utilisation from `sysinfo`.
pub struct SystemCpu {
    system: System,
}

impl SystemCpu {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSampler for SystemCpu {
    fn begin(&mut self) {
        self.system.refresh_cpu();
    }

    fn finish(&mut self) -> f32 {
        self.system.refresh_cpu();
        self.system.global_cpu_info().cpu_usage()
    }
}

/// Highest of `samples` readings, each taken over `window`.
///
/// The peak, not the mean: a single busy window is what alerting cares about.
pub async fn peak_cpu(sampler: &mut dyn CpuSampler, samples: usize, window: Duration) -> f32 {
    let mut peak = 0.0_f32;
    for _ in 0..samples {
        sampler.begin();
        tokio::time::sleep(window).await;
        let usage = clamp_percent(sampler.finish());
        tracing::trace!(usage, "cpu sample");
        peak = peak.max(usage);
    }
    peak
}

fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
