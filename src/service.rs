//! Service lifecycle control around a restore.

use std::{
    ffi::{OsStr, OsString},
    fmt,
};

use tracing::info;

use crate::{exec::Invocation, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies an action to a set of units. Failures are always fatal to the run.
pub trait ServiceControl {
    fn apply(&self, action: ServiceAction, units: &[&str]) -> Result<()>;
}

/// `systemctl <action> <units...>`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: OsString,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::with_program("systemctl")
    }
}

impl Systemctl {
    /// Drive services through a different control program.
    pub fn with_program(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    pub fn invocation(&self, action: ServiceAction, units: &[&str]) -> Invocation {
        Invocation::new(&self.program)
            .arg(action.as_str())
            .args(units)
    }
}

impl ServiceControl for Systemctl {
    fn apply(&self, action: ServiceAction, units: &[&str]) -> Result<()> {
        info!(%action, units = ?units, "service control");
        match self.invocation(action, units).run() {
            Err(err) => match err.downcast::<Error>() {
                Ok(Error::ToolFailed { status, .. }) => Err(Error::ServiceControl {
                    action: action.to_string(),
                    units: units.join(" "),
                    status,
                }
                .into()),
                Ok(other) => Err(other.into()),
                Err(err) => Err(err),
            },
            ok => ok,
        }
    }
}
