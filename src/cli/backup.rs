//! Implementation of `master-backup backup`.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::{
    orchestrator::{BackupOptions, Orchestrator},
    resource::FailurePolicy,
    Result,
};

#[derive(Debug, Clone, Args)]
pub struct BackupArgs {
    /// Destination for all created files
    pub backup_dir: PathBuf,

    /// Command run in the background with the archive path as its first argument
    #[arg(short = 'e', long = "callback")]
    pub callback: Option<String>,
}

pub fn execute(orchestrator: &Orchestrator, args: BackupArgs, policy: FailurePolicy) -> Result<()> {
    let outcome = orchestrator.backup(&BackupOptions {
        backup_dir: args.backup_dir,
        callback: args.callback,
        policy,
    })?;

    let skipped = outcome.report.failures().count();
    info!(
        archive = %outcome.archive.display(),
        skipped,
        "archive written"
    );
    Ok(())
}
