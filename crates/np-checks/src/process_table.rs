//! Read-only view of the running process list.
//!
//! Probes go through [`ProcessTable`] so tests can supply a fixed listing.
//! [`SystemProcessTable`] takes a fresh `sysinfo` snapshot on every call and
//! drops it before returning.

use sysinfo::System;

/// One row of the process list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Full command line, arguments joined by single spaces.
    pub cmdline: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, name: impl Into<String>, cmdline: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            cmdline: cmdline.into(),
        }
    }
}

pub trait ProcessTable: Send {
    fn snapshot(&self) -> Vec<ProcessEntry>;

    /// Whether `pid` still answers a liveness signal.
    fn is_alive(&self, pid: u32) -> bool {
        pid_alive(pid)
    }
}

/// The host's process list via `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let mut system = System::new();
        system.refresh_processes();
        let mut entries: Vec<ProcessEntry> = system
            .processes()
            .values()
            .map(|process| ProcessEntry {
                pid: process.pid().as_u32(),
                name: process.name().to_string(),
                cmdline: process.cmd().join(" "),
            })
            .collect();
        entries.sort_by_key(|e| e.pid);
        entries
    }
}

/// Check if a process with the given PID is alive.
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill with signal 0 checks existence without sending a signal.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
pub fn pid_alive(_pid: u32) -> bool {
    // No signal-based probe off Unix; a listed process counts as alive.
    true
}
