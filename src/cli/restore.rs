//! Implementation of `master-backup restore`.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::{
    config::Settings,
    exec::Invocation,
    orchestrator::{NodeCleanup, Orchestrator, RestoreOptions},
    resource::FailurePolicy,
    Result,
};

#[derive(Debug, Clone, Args)]
pub struct RestoreArgs {
    /// Archive produced by `master-backup backup`
    pub backup_file: PathBuf,
}

pub fn execute(
    orchestrator: &Orchestrator,
    settings: &Settings,
    args: RestoreArgs,
    policy: FailurePolicy,
    without_nodes: bool,
) -> Result<()> {
    let cleanup = if without_nodes {
        settings.cleanup_command.clone().map(external_cleanup)
    } else {
        None
    };

    let report = orchestrator.restore(
        &RestoreOptions {
            backup_file: args.backup_file,
            policy,
            without_nodes,
        },
        cleanup,
    )?;

    info!(
        restored = report.steps.len() - report.failures().count(),
        skipped = report.failures().count(),
        "restore complete"
    );
    Ok(())
}

/// Wrap the configured cleanup program as the node-cleanup collaborator.
pub fn external_cleanup(command: Vec<String>) -> NodeCleanup {
    Box::new(move || {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| crate::Error::Config("cleanup_command is empty".into()))?;
        Invocation::new(program).args(args).run()
    })
}
