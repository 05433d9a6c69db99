use std::io;
use std::path::{Path, PathBuf};

/// Mount-point usage lookup.
pub trait DiskUsage: Send {
    /// Usage percent of the filesystem mounted exactly at `mount`, or `None`
    /// when nothing is mounted there.
    fn usage_percent(&self, mount: &Path) -> io::Result<Option<u8>>;
}

/// Resolves mounts through a `/proc/mounts`-style table and `statvfs(3)`.
#[derive(Debug, Clone)]
pub struct MountTable {
    mounts_file: PathBuf,
}

impl MountTable {
    pub fn new(mounts_file: impl Into<PathBuf>) -> Self {
        Self {
            mounts_file: mounts_file.into(),
        }
    }

    fn is_mounted(&self, mount: &Path) -> io::Result<bool> {
        let table = std::fs::read_to_string(&self.mounts_file)?;
        let found = mount_points(&table).any(|m| Path::new(&m) == mount);
        Ok(found)
    }
}

impl DiskUsage for MountTable {
    fn usage_percent(&self, mount: &Path) -> io::Result<Option<u8>> {
        if !self.is_mounted(mount)? {
            return Ok(None);
        }
        let (used, avail) = block_counts(mount)?;
        Ok(Some(df_percent(used, avail)))
    }
}

/// Second column of each mounts line, with the kernel's octal escapes undone.
fn mount_points(table: &str) -> impl Iterator<Item = String> + '_ {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(unescape_mount)
}

fn unescape_mount(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

/// Usage percent the way `df` reports it: used over (used + available),
/// rounded up, so a filesystem with any reserved-block overlap never reads
/// lower than it is.
pub fn df_percent(used: u64, avail: u64) -> u8 {
    let total = used.saturating_add(avail);
    if total == 0 {
        return 0;
    }
    let pct = (used.saturating_mul(100)).div_ceil(total);
    pct.min(100) as u8
}

/// `(used, available)` blocks for the filesystem holding `path`.
#[cfg(unix)]
fn block_counts(path: &Path) -> io::Result<(u64, u64)> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: an all-zero statvfs is a valid value for a plain C struct.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is NUL-terminated and stat is a valid out-pointer.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    #[allow(clippy::unnecessary_cast)]
    let (blocks, free, avail) = (stat.f_blocks as u64, stat.f_bfree as u64, stat.f_bavail as u64);
    Ok((blocks.saturating_sub(free), avail))
}

#[cfg(not(unix))]
fn block_counts(_path: &Path) -> io::Result<(u64, u64)> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "statvfs is not available on this platform",
    ))
}
