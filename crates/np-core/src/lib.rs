//! Shared configuration and data model for the node-pulse agent.
//!
//! Every other crate in the workspace depends on this one: probes produce
//! [`types::CheckResult`]s, the collector produces a
//! [`types::MetricsSnapshot`], and the agent wraps it into a
//! [`types::HeartbeatReport`] for the control API. [`config::Config`] is
//! loaded once at startup and handed to each component's constructor.

pub mod config;
pub mod types;
