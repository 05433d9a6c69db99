//! Operational metrics for the heartbeat.
//!
//! Some values are single reads (uptime, monthly total, user count); CPU and
//! throughput need a real time window, so a full snapshot takes roughly four
//! and a half seconds of deliberate sleeping. CPU reports the peak of its
//! samples, throughput the mean; the asymmetry is intentional.

pub mod accounting;
pub mod collector;
pub mod cpu;
pub mod error;
pub mod sessions;
pub mod throughput;
pub mod uptime;

pub use collector::{MetricSources, MetricsCollector, SamplingPlan};
pub use error::MetricsError;
