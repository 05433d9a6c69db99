//! Local self-checks for a VPN node.
//!
//! A [`registry::CheckRegistry`] holds an ordered list of independent
//! [`registry::Probe`]s. Evaluating it runs every probe (no short-circuit)
//! and folds the outcomes into one [`np_core::types::AggregateResult`].
//! Probes never fail outward: any I/O error inside a probe becomes a failing
//! result with a message.

pub mod disk;
pub mod probes;
pub mod process_table;
pub mod registry;

pub use registry::{CheckRegistry, Probe, RegistryError};
