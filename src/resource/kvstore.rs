use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    archive::BackupArchive,
    config::KvStoreSettings,
    resource::{certs::PKI_ENTRY, fsops, Resource},
    Error, Result,
};

pub const DATA_ENTRY: &str = "etcd";
/// Placeholder the store's own backup tooling expects in the snapshot dir.
pub const FILLER: &str = "snap/dummy";
/// Both the data tree and the PKI directory live under this member prefix.
const MEMBER_PREFIX: &str = "etcd";
const REPLACED_SUBDIRS: [&str; 2] = ["wal", "snap"];

/// The key-value store's member data directory.
#[derive(Debug, Clone)]
pub struct KvStoreResource {
    settings: KvStoreSettings,
}

impl KvStoreResource {
    pub fn new(settings: KvStoreSettings) -> Self {
        Self { settings }
    }
}

impl Resource for KvStoreResource {
    fn name(&self) -> &str {
        "kv-store"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        let data_dir = &self.settings.data_dir;
        let result = fsops::stage_dir(staging, "etcd-", DATA_ENTRY, |tmp| {
            let copied = fsops::copy_tree(data_dir, tmp)?;
            debug!(files = copied, "store data copied");

            let filler = tmp.join(FILLER);
            if let Some(parent) = filler.parent() {
                fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(&filler)?;
            Ok(())
        })?;
        Ok(Some(result))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        archive.extract_prefix(MEMBER_PREFIX, scratch.path())?;

        let pki_src = scratch.path().join(PKI_ENTRY);
        if pki_src.is_dir() {
            fs::create_dir_all(&self.settings.pki_dir)?;
            let copied = fsops::copy_dir_files(&pki_src, &self.settings.pki_dir)?;
            info!(files = copied, pki = %self.settings.pki_dir.display(), "store certificates reinstalled");
        }

        let data_src = scratch.path().join(DATA_ENTRY);
        if !data_src.is_dir() {
            return Err(Error::MissingEntry(format!("{DATA_ENTRY}/")).into());
        }

        let data_dir = &self.settings.data_dir;
        for sub in REPLACED_SUBDIRS {
            fsops::remove_tree_if_present(&data_dir.join(sub))?;
        }
        fs::create_dir_all(data_dir)?;
        let copied = fsops::copy_tree(&data_src, data_dir)?;
        info!(files = copied, data_dir = %data_dir.display(), "store data restored");

        if let Some(owner) = self.settings.owner.as_deref() {
            fsops::chown_tree(data_dir, owner)?;
        }
        Ok(())
    }
}
