use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    archive::BackupArchive,
    resource::{fsops, Resource},
    Result,
};

pub const PKI_ENTRY: &str = "etcd_pki";

/// The key-value store's PKI directory. Captured for the operator; restore
/// leaves the live certificates alone.
#[derive(Debug, Clone)]
pub struct KvCertResource {
    pki_dir: PathBuf,
}

impl KvCertResource {
    pub fn new(pki_dir: impl Into<PathBuf>) -> Self {
        Self {
            pki_dir: pki_dir.into(),
        }
    }
}

impl Resource for KvCertResource {
    fn name(&self) -> &str {
        "kv-store-certs"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        let result = fsops::stage_dir(staging, "etcd-", PKI_ENTRY, |tmp| {
            fsops::copy_dir_files(&self.pki_dir, tmp)?;
            Ok(())
        })?;
        Ok(Some(result))
    }

    fn restore(&self, _archive: &mut BackupArchive) -> Result<()> {
        debug!("certificate restore is left to the kv-store step and the operator");
        Ok(())
    }
}
