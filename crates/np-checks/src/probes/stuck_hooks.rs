use np_core::types::CheckResult;
use regex::Regex;

use crate::process_table::ProcessTable;
use crate::registry::{Probe, RegistryError};

const NAME: &str = "StuckClientScripts";

/// The connect/disconnect hooks make one HTTP call and exit. One that is
/// still in the process list is hung and is blocking OpenVPN.
pub struct StuckHooksProbe<P> {
    pattern: Regex,
    processes: P,
}

impl<P: ProcessTable> StuckHooksProbe<P> {
    pub fn new(pattern: &str, processes: P) -> Result<Self, RegistryError> {
        let pattern =
            Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern(e.to_string()))?;
        Ok(Self { pattern, processes })
    }
}

impl<P: ProcessTable> Probe for StuckHooksProbe<P> {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> CheckResult {
        let stuck = self
            .processes
            .snapshot()
            .into_iter()
            .find(|p| self.pattern.is_match(&p.cmdline));
        match stuck {
            Some(p) => {
                tracing::debug!(pid = p.pid, cmdline = %p.cmdline, "hook script still running");
                CheckResult::fail(NAME, "client-{dis,}connect script is running")
            }
            None => CheckResult::pass(NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_table::ProcessEntry;

    struct Listing(Vec<ProcessEntry>);

    impl ProcessTable for Listing {
        fn snapshot(&self) -> Vec<ProcessEntry> {
            self.0.clone()
        }
    }

    fn probe(entries: Vec<ProcessEntry>) -> StuckHooksProbe<Listing> {
        StuckHooksProbe::new(".client-[cd]", Listing(entries)).unwrap()
    }

    #[test]
    fn no_hooks_running_passes() {
        let result = probe(vec![
            ProcessEntry::new(1, "init", "/sbin/init"),
            ProcessEntry::new(812, "openvpn", "/usr/sbin/openvpn --config server.conf"),
        ])
        .run();
        assert!(result.passed());
    }

    #[test]
    fn running_connect_hook_fails() {
        let result = probe(vec![ProcessEntry::new(
            4410,
            "np-client-conne",
            "/usr/local/bin/np-client-connect /tmp/openvpn_cc_1.tmp",
        )])
        .run();
        assert!(!result.passed());
        assert_eq!(result.message(), Some("client-{dis,}connect script is running"));
    }

    #[test]
    fn running_disconnect_hook_fails() {
        let result = probe(vec![ProcessEntry::new(
            4411,
            "python",
            "python /etc/openvpn/client-disconnect.py",
        )])
        .run();
        assert!(!result.passed());
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert!(StuckHooksProbe::new("client-[", Listing(vec![])).is_err());
    }
}
