//! Shared mocks for chain and orchestrator tests.
#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

use master_backup::{
    archive::BackupArchive,
    resource::{fsops, Resource},
    service::{ServiceAction, ServiceControl},
    Error, Result,
};

pub type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// External tool exited non-zero; skippable.
    Tool,
    /// Plain I/O error; never skippable.
    Io,
}

/// Resource that stages a fixed payload under its own name and records every
/// call plus the bytes it was handed back on restore.
pub struct RecordingResource {
    pub name: &'static str,
    pub payload: Vec<u8>,
    pub fail: Option<Failure>,
    pub optional: bool,
    pub journal: Journal,
    pub restored: Rc<RefCell<Vec<(String, Vec<u8>)>>>,
}

impl RecordingResource {
    pub fn new(name: &'static str, payload: &[u8], journal: &Journal) -> Self {
        Self {
            name,
            payload: payload.to_vec(),
            fail: None,
            optional: false,
            journal: Rc::clone(journal),
            restored: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.fail = Some(failure);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn fail_now(&self) -> Result<()> {
        match self.fail {
            None => Ok(()),
            Some(Failure::Tool) => Err(Error::ToolFailed {
                program: format!("{}-tool", self.name),
                status: "exit status: 1".into(),
            }
            .into()),
            Some(Failure::Io) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            ))
            .into()),
        }
    }
}

impl Resource for RecordingResource {
    fn name(&self) -> &str {
        self.name
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        self.journal.borrow_mut().push(format!("capture:{}", self.name));
        self.fail_now()?;
        if self.optional && self.payload.is_empty() {
            return Ok(None);
        }
        let payload = self.payload.clone();
        let path = fsops::stage_file(staging, "mock-", self.name, move |out| {
            out.write_all(&payload)?;
            Ok(())
        })?;
        Ok(Some(path))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        self.journal.borrow_mut().push(format!("restore:{}", self.name));
        self.fail_now()?;
        if self.optional && !archive.contains(self.name) {
            return Ok(());
        }
        let bytes = archive.read_entry(self.name)?;
        self.restored
            .borrow_mut()
            .push((self.name.to_string(), bytes));
        Ok(())
    }
}

/// Records `"<action> <units>"` for each call; optionally fails one action.
#[derive(Clone, Default)]
pub struct RecordingServices {
    pub calls: Journal,
    pub fail_on: Option<ServiceAction>,
}

impl ServiceControl for RecordingServices {
    fn apply(&self, action: ServiceAction, units: &[&str]) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("{action} {}", units.join(" ")));
        if self.fail_on == Some(action) {
            return Err(Error::ServiceControl {
                action: action.to_string(),
                units: units.join(" "),
                status: "exit status: 5".into(),
            }
            .into());
        }
        Ok(())
    }
}

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}
