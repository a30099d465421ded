//! Resources: one per subsystem whose on-disk state is backed up.
//!
//! Each resource stages its capture output inside the run's staging directory
//! and reads its own members back out of an archive on restore. The chain runs
//! them one at a time in a fixed order.

pub mod certs;
pub mod chain;
pub mod database;
pub mod fsops;
pub mod kvstore;
pub mod license;
pub mod proxy;
pub mod ssh;
pub mod tokens;

use std::path::{Path, PathBuf};

use crate::{archive::BackupArchive, Result};

pub use certs::KvCertResource;
pub use chain::{ChainReport, FailurePolicy, ResourceChain, StepRecord, StepStatus};
pub use database::DatabaseResource;
pub use kvstore::KvStoreResource;
pub use license::LicenseResource;
pub use proxy::ProxyConfigResource;
pub use ssh::SshKeyResource;
pub use tokens::ClusterTokenResource;

pub trait Resource {
    /// Identity used in logs and run reports.
    fn name(&self) -> &str;

    /// Place this subsystem's state under `staging`. Returns the produced path,
    /// or `None` when there is nothing to capture.
    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>>;

    /// Write this subsystem's members from `archive` back to their live
    /// locations. Optional members that are absent are a no-op.
    fn restore(&self, archive: &mut BackupArchive) -> Result<()>;
}
