use np_core::config::Config;
use np_core::types::{AggregateResult, CheckResult};
use tracing::{debug, error};

use crate::disk::MountTable;
use crate::probes::{
    FilesystemProbe, ProcessAliveProbe, StatusFilesProbe, StuckHooksProbe, TmpfsProbe,
};
use crate::process_table::SystemProcessTable;

/// A named, independent health test.
///
/// `run` must be total: implementations catch their own I/O failures and
/// report them as a failing [`CheckResult`].
pub trait Probe: Send {
    /// Display name, unique within a registry.
    fn name(&self) -> &str;

    fn run(&self) -> CheckResult;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a probe named '{0}' is already registered")]
    DuplicateName(String),
    #[error("invalid hook pattern: {0}")]
    InvalidPattern(String),
}

/// Ordered set of probes. Order is evaluation order; it does not affect the
/// aggregate outcome, only the order of collected messages.
#[derive(Default)]
pub struct CheckRegistry {
    probes: Vec<Box<dyn Probe>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five node probes, wired from config.
    pub fn standard(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(FilesystemProbe::new(&config.checks.probe_dir))?;
        registry.register(TmpfsProbe::new(
            &config.checks.tmpfs_mount,
            config.checks.tmpfs_max_percent,
            MountTable::new(&config.checks.mounts_file),
        ))?;
        registry.register(StatusFilesProbe::new(
            config.openvpn.status_files.clone(),
            config.checks.status_max_age_secs,
        ))?;
        registry.register(StuckHooksProbe::new(
            &config.openvpn.hook_pattern,
            SystemProcessTable,
        )?)?;
        registry.register(ProcessAliveProbe::new(
            &config.openvpn.process_name,
            SystemProcessTable,
        ))?;
        Ok(registry)
    }

    /// Append a probe. Names must be unique.
    pub fn register(&mut self, probe: impl Probe + 'static) -> Result<(), RegistryError> {
        if self.probes.iter().any(|p| p.name() == probe.name()) {
            return Err(RegistryError::DuplicateName(probe.name().to_string()));
        }
        self.probes.push(Box::new(probe));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Run every probe in order and return the individual results.
    pub fn run_all(&self) -> Vec<CheckResult> {
        self.probes
            .iter()
            .map(|probe| {
                let result = probe.run();
                debug!(check = result.name(), passed = result.passed(), "self-check ran");
                result
            })
            .collect()
    }

    /// Run every probe and fold the outcomes. Each failure message is logged
    /// at error level so it reaches the debug file.
    pub fn evaluate(&self) -> AggregateResult {
        let results = self.run_all();
        let aggregate = AggregateResult::from_results(&results);
        for message in &aggregate.messages {
            error!("{message}");
        }
        aggregate
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("probes", &self.names())
            .finish()
    }
}
