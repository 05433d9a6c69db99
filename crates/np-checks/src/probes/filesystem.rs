use std::io::Write;
use std::path::{Path, PathBuf};

use np_core::types::CheckResult;
use tracing::debug;

use crate::registry::Probe;

const NAME: &str = "Filesystem";

/// Fails when a scratch file cannot be created and removed, which on these
/// nodes means the root filesystem was remounted read-only.
#[derive(Debug, Clone)]
pub struct FilesystemProbe {
    dir: PathBuf,
}

impl FilesystemProbe {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn scratch_path(&self) -> PathBuf {
        self.dir
            .join(format!(".np-write-probe-{}.dat", std::process::id()))
    }
}

fn write_and_remove(path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(b"ok")?;
    drop(file);
    std::fs::remove_file(path)
}

impl Probe for FilesystemProbe {
    fn name(&self) -> &str {
        NAME
    }

    fn run(&self) -> CheckResult {
        let path = self.scratch_path();
        match write_and_remove(&path) {
            Ok(()) => CheckResult::pass(NAME),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "write probe failed");
                // Best effort: creation may have succeeded before the failure.
                let _ = std::fs::remove_file(&path);
                CheckResult::fail(NAME, "Filesystem in read-only mode")
            }
        }
    }
}
