//! Logging setup shared by the agent and the OpenVPN hook binaries.
//!
//! Every binary logs through `tracing`. Output goes to a timestamped
//! console sink and, optionally, to an append-only debug file that always
//! receives warnings and errors so failures survive the cron run.

pub mod logging;
