use thiserror::Error;

pub mod archive;
pub mod cli;
pub mod config;
pub mod exec;
pub mod guard;
pub mod logging;
pub mod orchestrator;
pub mod resource;
pub mod service;

pub type Result<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "another backup/restore process is already running; if it is not, remove `{0}` and try again"
    )]
    AlreadyRunning(String),
    #[error("`{program}` failed: {status}")]
    ToolFailed { program: String, status: String },
    #[error("{resource} capture failed: {reason}")]
    CaptureFailed { resource: String, reason: String },
    #[error("{resource} restore failed: {reason}")]
    RestoreFailed { resource: String, reason: String },
    #[error("service control failed: {action} {units}: {status}")]
    ServiceControl {
        action: String,
        units: String,
        status: String,
    },
    #[error("archive entry missing: {0}")]
    MissingEntry(String),
    #[error("unknown system account: {0}")]
    UnknownAccount(String),
    #[error("root permissions required to run master-backup")]
    NotRoot,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("archive error")]
    Archive(#[from] zip::result::ZipError),
    #[error("serialization error")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cli error: {0}")]
    Cli(String),
}

impl Error {
    /// True for failures a Resource step may have skipped under `--skip`.
    pub fn is_tool_failure(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Error>(), Some(Error::ToolFailed { .. }))
    }
}

/// Entry point for the library, called by the CLI thin wrapper.
pub fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli_args = cli::parse_args(args.into_iter().map(Into::into))?;

    // Logging comes up before anything that can fail on the host.
    let log = logging::init(cli_args.log_level)?;

    cli::dispatch(cli_args, log)
}
