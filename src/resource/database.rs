use std::{
    os::unix::fs::fchown,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    archive::BackupArchive,
    config::DatabaseSettings,
    exec::Invocation,
    resource::{fsops, Resource},
    Result,
};

pub const DUMP_ENTRY: &str = "postgresql.backup";

/// Custom-format dump of the application database.
#[derive(Debug, Clone)]
pub struct DatabaseResource {
    settings: DatabaseSettings,
}

impl DatabaseResource {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }

    pub fn dump_invocation(&self) -> Invocation {
        let s = &self.settings;
        Invocation::new(&s.dump_program)
            .args(["-C", "-Fc", "-U", s.user.as_str(), s.name.as_str()])
            .nice(s.niceness)
            .sudo(s.os_user.as_deref())
    }

    pub fn restore_invocation(&self, input: &Path) -> Invocation {
        let s = &self.settings;
        Invocation::new(&s.restore_program)
            .args([
                "-U",
                s.user.as_str(),
                "-n",
                s.schema.as_str(),
                "-c",
                "-1",
                "-d",
                s.name.as_str(),
            ])
            .arg(input)
            .sudo(s.os_user.as_deref())
    }
}

impl Resource for DatabaseResource {
    fn name(&self) -> &str {
        "database"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        let dump = self.dump_invocation();
        let result = fsops::stage_file(staging, "postgres-", DUMP_ENTRY, |out| {
            dump.run_to(out.try_clone()?)
        })?;
        Ok(Some(result))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        let mut input = tempfile::Builder::new()
            .prefix("postgres-restore-")
            .tempfile()?;
        archive.copy_entry(DUMP_ENTRY, input.as_file_mut())?;
        input.as_file().sync_all()?;

        // The restore tool runs as the database account and must read the file.
        if let Some(user) = self.settings.os_user.as_deref() {
            let (uid, _) = fsops::lookup_account(user)?;
            fchown(input.as_file(), Some(uid), None)?;
        }

        self.restore_invocation(input.path()).run()?;
        info!(database = %self.settings.name, "database restored");
        Ok(())
    }
}
