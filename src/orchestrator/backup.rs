use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    archive,
    exec,
    guard::with_lock,
    resource::{ChainReport, FailurePolicy},
    Result,
};

use super::Orchestrator;

/// Run log written into the staging directory and packaged with it.
pub const RUN_LOG: &str = "main.log";

#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    pub backup_dir: PathBuf,
    /// Shell command launched with the archive path once the backup is done.
    pub callback: Option<String>,
    pub policy: FailurePolicy,
}

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub archive: PathBuf,
    /// Left on disk after packaging.
    pub staging: PathBuf,
    pub report: ChainReport,
}

impl Orchestrator {
    #[instrument(skip_all, fields(backup_dir = %opts.backup_dir.display()))]
    pub fn backup(&self, opts: &BackupOptions) -> Result<BackupOutcome> {
        with_lock(&self.lock_file, || self.backup_locked(opts))
    }

    fn backup_locked(&self, opts: &BackupOptions) -> Result<BackupOutcome> {
        fs::create_dir_all(&opts.backup_dir)?;

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        info!(backup_dir = %opts.backup_dir.display(), "backup started");
        let staging = create_staging(&opts.backup_dir, &timestamp)?;

        let report = {
            let _run_log = self.log.attach_run_log(&staging.join(RUN_LOG))?;
            info!(staging = %staging.display(), policy = ?opts.policy, "staging directory ready");
            let report = self.chain.capture_all(&staging, opts.policy)?;
            for failed in report.failures() {
                warn!(resource = %failed.resource, "resource skipped after failure");
            }
            report
        };

        let archive = opts.backup_dir.join(format!("{timestamp}.zip"));
        let members = archive::pack_dir(&staging, &archive)?;
        info!(archive = %archive.display(), members, "backup finished");

        if let Some(callback) = opts.callback.as_deref() {
            exec::spawn_callback(callback, &archive);
        }

        Ok(BackupOutcome {
            archive,
            staging,
            report,
        })
    }
}

/// Fresh `<timestamp>-<suffix>` directory; creation fails rather than reuse.
fn create_staging(backup_dir: &Path, timestamp: &str) -> Result<PathBuf> {
    let suffix = Uuid::new_v4().simple().to_string();
    let staging = backup_dir.join(format!("{timestamp}-{}", &suffix[..8]));
    fs::create_dir(&staging)?;
    Ok(staging)
}
