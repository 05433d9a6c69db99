use std::path::PathBuf;

use np_core::types::CheckResult;

use crate::disk::{DiskUsage, MountTable};
use crate::registry::Probe;

const NAME: &str = "TMPFS";

/// Watches the RAM-backed mount that holds the OpenVPN status files and the
/// debug log. A full tmpfs silently stops status updates.
pub struct TmpfsProbe<D = MountTable> {
    mount: PathBuf,
    max_percent: u8,
    disk: D,
}

impl<D: DiskUsage> TmpfsProbe<D> {
    pub fn new(mount: impl Into<PathBuf>, max_percent: u8, disk: D) -> Self {
        Self {
            mount: mount.into(),
            max_percent,
            disk,
        }
    }
}

impl<D: DiskUsage> Probe for TmpfsProbe<D> {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> CheckResult {
        match self.disk.usage_percent(&self.mount) {
            Ok(None) => CheckResult::fail(NAME, format!("{} not mounted", self.mount.display())),
            Ok(Some(pct)) if pct >= self.max_percent => {
                CheckResult::fail(NAME, "tmpfs is filling up")
            }
            Ok(Some(_)) => CheckResult::pass(NAME),
            Err(e) => CheckResult::fail(
                NAME,
                format!("cannot read usage of {}: {e}", self.mount.display()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    struct FixedUsage(io::Result<Option<u8>>);

    impl DiskUsage for FixedUsage {
        fn usage_percent(&self, _mount: &Path) -> io::Result<Option<u8>> {
            match &self.0 {
                Ok(v) => Ok(*v),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn probe(usage: io::Result<Option<u8>>) -> TmpfsProbe<FixedUsage> {
        TmpfsProbe::new("/tmp/lokun", 80, FixedUsage(usage))
    }

    #[test]
    fn exactly_eighty_percent_fails() {
        let result = probe(Ok(Some(80))).run();
        assert!(!result.passed());
        assert_eq!(result.message(), Some("tmpfs is filling up"));
    }

    #[test]
    fn seventy_nine_percent_passes() {
        assert!(probe(Ok(Some(79))).run().passed());
    }

    #[test]
    fn full_mount_fails() {
        assert!(!probe(Ok(Some(100))).run().passed());
    }

    #[test]
    fn absent_mount_fails() {
        let result = probe(Ok(None)).run();
        assert!(!result.passed());
        assert_eq!(result.message(), Some("/tmp/lokun not mounted"));
    }

    #[test]
    fn read_error_fails_with_reason() {
        let result = probe(Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))).run();
        assert!(!result.passed());
        assert!(result.message().unwrap().contains("denied"));
    }
}
