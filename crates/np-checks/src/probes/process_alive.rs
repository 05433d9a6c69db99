use np_core::types::CheckResult;

use crate::process_table::ProcessTable;
use crate::registry::Probe;

const NAME: &str = "ProcessAlive";

/// The tunnel server must be listed and every listed instance must still
/// answer `kill(pid, 0)`. A listed but dead pid is a zombie entry.
pub struct ProcessAliveProbe<P> {
    process_name: String,
    processes: P,
}

impl<P: ProcessTable> ProcessAliveProbe<P> {
    pub fn new(process_name: impl Into<String>, processes: P) -> Self {
        Self {
            process_name: process_name.into(),
            processes,
        }
    }
}

impl<P: ProcessTable> Probe for ProcessAliveProbe<P> {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> CheckResult {
        let pids: Vec<u32> = self
            .processes
            .snapshot()
            .into_iter()
            .filter(|p| p.name == self.process_name)
            .map(|p| p.pid)
            .collect();
        if pids.is_empty() {
            return CheckResult::fail(
                NAME,
                format!("{} process not found with ps", self.process_name),
            );
        }
        match pids.into_iter().find(|pid| !self.processes.is_alive(*pid)) {
            Some(dead) => CheckResult::fail(NAME, format!("{} pid {dead} dead", self.process_name)),
            None => CheckResult::pass(NAME),
        }
    }
}
