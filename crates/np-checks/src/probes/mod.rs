//! The node's built-in probes.

mod filesystem;
mod process_alive;
mod status_files;
mod stuck_hooks;
mod tmpfs;

pub use filesystem::FilesystemProbe;
pub use process_alive::ProcessAliveProbe;
pub use status_files::StatusFilesProbe;
pub use stuck_hooks::StuckHooksProbe;
pub use tmpfs::TmpfsProbe;
