//! Backup and restore runs.
//!
//! Both run under the exclusivity guard and walk the same resource chain in
//! the same order. Per-step failures follow the run's
//! [`FailurePolicy`](crate::resource::FailurePolicy);
//! guard and service-control failures always end the run.

pub mod backup;
pub mod restore;

use std::path::{Path, PathBuf};

use crate::{
    config::{ServiceSettings, Settings},
    logging::LogContext,
    resource::ResourceChain,
    service::{ServiceControl, Systemctl},
};

pub use backup::{BackupOptions, BackupOutcome, RUN_LOG};
pub use restore::{NodeCleanup, RestoreOptions};

pub struct Orchestrator {
    chain: ResourceChain,
    lock_file: PathBuf,
    log: LogContext,
    services: Box<dyn ServiceControl>,
    service_plan: ServiceSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("chain", &self.chain)
            .field("lock_file", &self.lock_file)
            .field("service_plan", &self.service_plan)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        chain: ResourceChain,
        lock_file: impl Into<PathBuf>,
        log: LogContext,
        services: Box<dyn ServiceControl>,
        service_plan: ServiceSettings,
    ) -> Self {
        Self {
            chain,
            lock_file: lock_file.into(),
            log,
            services,
            service_plan,
        }
    }

    /// The production wiring: standard chain and `systemctl`.
    pub fn from_settings(settings: &Settings, log: LogContext) -> Self {
        Self::new(
            ResourceChain::standard(settings),
            &settings.lock_file,
            log,
            Box::new(Systemctl::default()),
            settings.services.clone(),
        )
    }

    pub fn chain(&self) -> &ResourceChain {
        &self.chain
    }

    pub fn lock_file(&self) -> &Path {
        &self.lock_file
    }
}
