//! Command-line surface: `backup` and `restore` plus shared flags.

use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};

use crate::{
    config::Settings,
    logging::{LogContext, LogLevel},
    orchestrator::Orchestrator,
    resource::FailurePolicy,
    Error, Result,
};

pub mod backup;
pub mod restore;

#[derive(Debug, Clone)]
pub enum Command {
    Backup(backup::BackupArgs),
    Restore(restore::RestoreArgs),
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub log_level: LogLevel,
    pub skip_errors: bool,
    pub without_nodes: bool,
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Refuse to touch the host unless running as root.
pub fn ensure_root() -> Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(Error::NotRoot.into());
    }
    Ok(())
}

pub fn dispatch(args: CliArgs, log: LogContext) -> Result<()> {
    ensure_root()?;

    let settings = Settings::load(args.config.as_deref())?;
    let orchestrator = Orchestrator::from_settings(&settings, log);
    let policy = FailurePolicy::from_skip(args.skip_errors);

    match args.command {
        Command::Backup(b) => backup::execute(&orchestrator, b, policy),
        Command::Restore(r) => {
            restore::execute(&orchestrator, &settings, r, policy, args.without_nodes)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "master-backup",
    version,
    about = "Back up and restore the persistent state of a cluster master node"
)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    /// After restore, remove node and pod records carried over in the backup
    #[arg(short = 'n', long = "without-nodes", global = true)]
    without_nodes: bool,

    /// Continue past failing resource steps instead of aborting the run
    #[arg(short = 's', long = "skip", global = true)]
    skip: bool,

    /// JSON file overriding the default host layout and service names
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Subcommands,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Capture every resource into `<BACKUP_DIR>/<timestamp>.zip`.
    Backup(backup::BackupArgs),
    /// Restore every resource from an archive produced by `backup`.
    Restore(restore::RestoreArgs),
}

/// Parse CLI arguments into internal representation. Help and version
/// requests print and exit; any other parse problem becomes [`Error::Cli`].
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv: Vec<String> = args.into_iter().map(Into::into).collect();
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return Err(Error::Cli(err.to_string()).into()),
    };

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let command = match cli.command {
        Subcommands::Backup(args) => Command::Backup(args),
        Subcommands::Restore(args) => Command::Restore(args),
    };

    Ok(CliArgs {
        log_level,
        skip_errors: cli.skip,
        without_nodes: cli.without_nodes,
        config: cli.config,
        command,
    })
}

/// Build the underlying clap `Command` (useful for help/usage contract tests).
pub fn clap_command() -> clap::Command {
    Cli::command()
}
