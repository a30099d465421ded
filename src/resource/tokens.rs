use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    archive::BackupArchive,
    resource::{fsops, Resource},
    Result,
};

pub const KNOWN_TOKENS_ENTRY: &str = "known_tokens.csv";
pub const NODE_CONFIG_ENTRY: &str = "configfile_for_nodes";

/// Cluster bootstrap files: the API token list and the node kubeconfig.
#[derive(Debug, Clone)]
pub struct ClusterTokenResource {
    known_tokens: PathBuf,
    node_configfile: PathBuf,
}

impl ClusterTokenResource {
    pub fn new(known_tokens: impl Into<PathBuf>, node_configfile: impl Into<PathBuf>) -> Self {
        Self {
            known_tokens: known_tokens.into(),
            node_configfile: node_configfile.into(),
        }
    }
}

impl Resource for ClusterTokenResource {
    fn name(&self) -> &str {
        "cluster-tokens"
    }

    fn capture(&self, staging: &Path) -> Result<Option<PathBuf>> {
        let tokens = fsops::stage_copy(staging, &self.known_tokens, "tokens-", KNOWN_TOKENS_ENTRY)?;
        fsops::stage_copy(staging, &self.node_configfile, "nodecfg-", NODE_CONFIG_ENTRY)?;
        Ok(Some(tokens))
    }

    fn restore(&self, archive: &mut BackupArchive) -> Result<()> {
        archive.write_entry_to(KNOWN_TOKENS_ENTRY, &self.known_tokens)?;
        archive.write_entry_to(NODE_CONFIG_ENTRY, &self.node_configfile)?;
        info!(
            tokens = %self.known_tokens.display(),
            node_config = %self.node_configfile.display(),
            "bootstrap files restored"
        );
        Ok(())
    }
}
