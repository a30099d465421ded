use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    os::unix::fs::{OpenOptionsExt, PermissionsExt},
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    archive::BackupArchive,
    resource::{fsops, Resource},
    Result,
};

pub const PRIVATE_KEY_ENTRY: &str = "id_rsa";
pub const PUBLIC_KEY_ENTRY: &str = "id_rsa.pub";

/// SSH key pair the control plane uses to reach nodes.
#[derive(Debug, Clone)]
pub struct SshKeyResource {
    private_key: PathBuf,
}

impl SshKeyResource {
    pub fn new(private_key: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
        }
    }

    /// `<private key>.pub`
    pub fn public_key(&self) -> PathBuf {
        let mut name: OsString = self.private_key.clone().into_os_string();
        name.push(".pub");
        PathBuf::from(name)
    }
}

impl Resource for SshKeyResource {
    fn name(&self) -> &str {
        "ssh-keys"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        fsops::stage_copy(staging, &self.public_key(), "ssh-pub-", PUBLIC_KEY_ENTRY)?;
        let result = fsops::stage_copy(staging, &self.private_key, "ssh-key-", PRIVATE_KEY_ENTRY)?;
        Ok(Some(result))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        // Never readable by others, even for a key that already exists.
        let mut key = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.private_key)?;
        key.set_permissions(fs::Permissions::from_mode(0o600))?;
        archive.copy_entry(PRIVATE_KEY_ENTRY, &mut key)?;
        key.sync_all()?;
        archive.write_entry_to(PUBLIC_KEY_ENTRY, &self.public_key())?;
        info!(key = %self.private_key.display(), "ssh key pair restored");
        Ok(())
    }
}
