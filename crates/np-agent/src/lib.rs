//! Heartbeat delivery, the run orchestrator and the OpenVPN client hooks.
//!
//! - [`transport`]: the HTTP seam (`reqwest` in production, fakes in tests)
//! - [`heartbeat`]: bounded-retry delivery of one [`np_core::types::HeartbeatReport`]
//! - [`agent`]: one cron run: snapshot, send, log the outcome
//! - [`hooks`]: `client-connect` / `client-disconnect` calls
//! - [`startup`]: config, identity and logging bootstrap shared by the binaries

pub mod agent;
pub mod heartbeat;
pub mod hooks;
pub mod startup;
pub mod transport;
