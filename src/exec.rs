//! External tool invocation.
//!
//! Tools run synchronously and a non-zero exit becomes [`Error::ToolFailed`].
//! Failing to launch a tool at all is an I/O error and is never skippable.

use std::{
    ffi::{OsStr, OsString},
    fs::File,
    path::Path,
    process::{Command, ExitStatus, Stdio},
};

use tracing::{debug, info, warn};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            argv: vec![program.as_ref().to_os_string()],
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.argv.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.argv
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Lower the scheduling priority with `nice -n`.
    pub fn nice(self, niceness: Option<i32>) -> Self {
        match niceness {
            Some(n) => self.prefixed(["nice".into(), "-n".into(), n.to_string().into()]),
            None => self,
        }
    }

    /// Run as another account with `sudo -u`.
    pub fn sudo(self, user: Option<&str>) -> Self {
        match user {
            Some(user) => self.prefixed(["sudo".into(), "-u".into(), user.into()]),
            None => self,
        }
    }

    fn prefixed<const N: usize>(mut self, prefix: [OsString; N]) -> Self {
        let mut argv = prefix.to_vec();
        argv.append(&mut self.argv);
        self.argv = argv;
        self
    }

    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }

    pub fn display(&self) -> String {
        self.argv
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.argv[0]);
        cmd.args(&self.argv[1..]);
        cmd
    }

    /// Run to completion, discarding stdout.
    pub fn run(&self) -> Result<()> {
        debug!(command = %self.display(), "running");
        let status = self.command().stdout(Stdio::null()).status()?;
        self.check(status)
    }

    /// Run to completion with stdout written to `out`.
    pub fn run_to(&self, out: File) -> Result<()> {
        debug!(command = %self.display(), "running");
        let status = self.command().stdout(Stdio::from(out)).status()?;
        self.check(status)
    }

    fn check(&self, status: ExitStatus) -> Result<()> {
        if status.success() {
            return Ok(());
        }
        Err(Error::ToolFailed {
            program: self.display(),
            status: status.to_string(),
        }
        .into())
    }
}

/// Launch `callback` through the shell with `archive` as its first argument
/// and return without waiting. The outcome never reaches the caller.
pub fn spawn_callback(callback: &str, archive: &Path) {
    let script = format!("{callback} \"$1\"");
    let spawned = Command::new("sh")
        .arg("-c")
        .arg(&script)
        .arg("master-backup-callback")
        .arg(archive)
        .stdin(Stdio::null())
        .spawn();

    match spawned {
        Ok(child) => info!(callback, pid = child.id(), "callback launched"),
        Err(err) => warn!(callback, error = %err, "failed to launch callback"),
    }
}
