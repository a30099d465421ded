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

pub const CONFIG_ENTRY: &str = "nginx_config";
const MEMBER_PREFIX: &str = "nginx";

/// Shared reverse-proxy configuration directory.
#[derive(Debug, Clone)]
pub struct ProxyConfigResource {
    config_dir: PathBuf,
}

impl ProxyConfigResource {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }
}

impl Resource for ProxyConfigResource {
    fn name(&self) -> &str {
        "proxy-config"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        let result = fsops::stage_dir(staging, "nginx-config-", CONFIG_ENTRY, |tmp| {
            fsops::copy_dir_files(&self.config_dir, tmp)?;
            Ok(())
        })?;
        Ok(Some(result))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        archive.extract_prefix(MEMBER_PREFIX, scratch.path())?;

        let src = scratch.path().join(CONFIG_ENTRY);
        if !src.is_dir() {
            // An empty config directory packs to no members at all.
            debug!("archive carries no proxy configuration");
            return Ok(());
        }
        fs::create_dir_all(&self.config_dir)?;
        let copied = fsops::copy_dir_files(&src, &self.config_dir)?;
        info!(files = copied, dir = %self.config_dir.display(), "proxy configuration restored");
        Ok(())
    }
}
