use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    archive::BackupArchive,
    resource::{fsops, Resource},
    Result,
};

pub const LICENSE_ENTRY: &str = ".license";

/// Optional product license file.
#[derive(Debug, Clone)]
pub struct LicenseResource {
    path: PathBuf,
}

impl LicenseResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Resource for LicenseResource {
    fn name(&self) -> &str {
        "license"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "no license installed");
            return Ok(None);
        }
        let result = fsops::stage_copy(staging, &self.path, "license-", LICENSE_ENTRY)?;
        Ok(Some(result))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        if !archive.contains(LICENSE_ENTRY) {
            debug!("archive carries no license");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        archive.write_entry_to(LICENSE_ENTRY, &self.path)?;
        info!(path = %self.path.display(), "license restored");
        Ok(())
    }
}
