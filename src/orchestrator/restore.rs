use std::{path::PathBuf, thread};

use tracing::{info, instrument};

use crate::{
    archive::BackupArchive,
    guard::ExclusivityGuard,
    resource::{ChainReport, FailurePolicy},
    service::ServiceAction,
    Error, Result,
};

use super::Orchestrator;

/// Removes stale node records after a restore onto a fresh cluster.
pub type NodeCleanup = Box<dyn FnOnce() -> Result<()>>;

#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub backup_file: PathBuf,
    pub policy: FailurePolicy,
    pub without_nodes: bool,
}

impl Orchestrator {
    /// Restore every resource from `opts.backup_file`, stopping and restarting
    /// the dependent services around the chain. `cleanup` runs last when
    /// `opts.without_nodes` is set and must be provided in that case.
    #[instrument(skip_all, fields(backup_file = %opts.backup_file.display()))]
    pub fn restore(
        &self,
        opts: &RestoreOptions,
        cleanup: Option<NodeCleanup>,
    ) -> Result<ChainReport> {
        let cleanup = match (opts.without_nodes, cleanup) {
            (true, None) => {
                return Err(Error::Config(
                    "restore without nodes requested but no cleanup routine is configured".into(),
                )
                .into())
            }
            (true, Some(cleanup)) => Some(cleanup),
            (false, _) => None,
        };

        let _guard = ExclusivityGuard::acquire(&self.lock_file)?;
        info!(backup_file = %opts.backup_file.display(), "restore started");

        let plan = &self.service_plan;
        // The database must be up for its own restore; the store and API
        // server must be down while their state is replaced.
        self.services
            .apply(ServiceAction::Restart, &[plan.database.as_str()])?;
        self.services.apply(
            ServiceAction::Stop,
            &[plan.kv_store.as_str(), plan.api_server.as_str()],
        )?;

        let mut archive = BackupArchive::open(&opts.backup_file)?;
        let report = self.chain.restore_all(&mut archive, opts.policy)?;

        self.services
            .apply(ServiceAction::Start, &[plan.kv_store.as_str()])?;
        thread::sleep(plan.settle_interval());
        self.services
            .apply(ServiceAction::Start, &[plan.api_server.as_str()])?;

        self.services
            .apply(ServiceAction::Restart, &[plan.proxy.as_str()])?;
        self.services
            .apply(ServiceAction::Restart, &[plan.app_server.as_str()])?;

        if let Some(cleanup) = cleanup {
            info!("removing node records from the restored cluster");
            cleanup()?;
        }

        info!("restore finished");
        Ok(report)
    }
}
