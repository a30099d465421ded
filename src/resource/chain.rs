use std::{
    fmt,
    path::{Path, PathBuf},
};

use tracing::{error, info};

use crate::{archive::BackupArchive, config::Settings, Error, Result};

use super::{
    ClusterTokenResource, DatabaseResource, KvCertResource, KvStoreResource, LicenseResource,
    ProxyConfigResource, Resource, SshKeyResource,
};

/// What happens when a resource step's external tool fails. Chosen once per
/// run and applied to every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Abort,
    Skip,
}

impl FailurePolicy {
    pub fn from_skip(skip_errors: bool) -> Self {
        if skip_errors {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    Restore,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Capture => f.write_str("capture"),
            Phase::Restore => f.write_str("restore"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Captured(Option<PathBuf>),
    Restored,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub resource: String,
    pub status: StepStatus,
}

/// Outcome of every attempted step, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub steps: Vec<StepRecord>,
}

impl ChainReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Paths produced by successful captures.
    pub fn produced(&self) -> Vec<&Path> {
        self.steps
            .iter()
            .filter_map(|s| match &s.status {
                StepStatus::Captured(Some(path)) => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, resource: &str, status: StepStatus) {
        self.steps.push(StepRecord {
            resource: resource.to_string(),
            status,
        });
    }
}

/// Fixed, ordered set of resources shared by backup and restore.
pub struct ResourceChain {
    resources: Vec<Box<dyn Resource>>,
}

impl fmt::Debug for ResourceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ResourceChain {
    pub fn new(resources: Vec<Box<dyn Resource>>) -> Self {
        Self { resources }
    }

    /// The master-node chain: database, store data, SSH keys, store
    /// certificates, bootstrap files, license, proxy configuration.
    pub fn standard(settings: &Settings) -> Self {
        Self::new(vec![
            Box::new(DatabaseResource::new(settings.database.clone())),
            Box::new(KvStoreResource::new(settings.kv_store.clone())),
            Box::new(SshKeyResource::new(&settings.ssh_key)),
            Box::new(KvCertResource::new(&settings.kv_store.pki_dir)),
            Box::new(ClusterTokenResource::new(
                &settings.known_tokens,
                &settings.node_configfile,
            )),
            Box::new(LicenseResource::new(&settings.license)),
            Box::new(ProxyConfigResource::new(&settings.proxy_config_dir)),
        ])
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Run every capture in order into `staging`.
    pub fn capture_all(&self, staging: &Path, policy: FailurePolicy) -> Result<ChainReport> {
        let mut report = ChainReport::default();
        for resource in &self.resources {
            match resource.capture(staging) {
                Ok(produced) => {
                    match &produced {
                        Some(path) => info!(resource = resource.name(), path = %path.display(), "file collected"),
                        None => info!(resource = resource.name(), "nothing to collect"),
                    }
                    report.push(resource.name(), StepStatus::Captured(produced));
                }
                Err(err) => {
                    step_failed(resource.name(), Phase::Capture, err, policy, &mut report)?
                }
            }
        }
        Ok(report)
    }

    /// Run every restore in order against `archive`.
    pub fn restore_all(
        &self,
        archive: &mut BackupArchive,
        policy: FailurePolicy,
    ) -> Result<ChainReport> {
        let mut report = ChainReport::default();
        for resource in &self.resources {
            match resource.restore(archive) {
                Ok(()) => {
                    info!(resource = resource.name(), "restored");
                    report.push(resource.name(), StepStatus::Restored);
                }
                Err(err) => {
                    step_failed(resource.name(), Phase::Restore, err, policy, &mut report)?
                }
            }
        }
        Ok(report)
    }
}

/// Only failed external tools are subject to the policy; anything else ends
/// the run.
fn step_failed(
    resource: &str,
    phase: Phase,
    err: anyhow::Error,
    policy: FailurePolicy,
    report: &mut ChainReport,
) -> Result<()> {
    error!(resource, error = %format!("{err:#}"), "{phase} error");

    if !Error::is_tool_failure(&err) {
        return Err(err.context(format!("{resource} {phase} failed")));
    }

    let reason = format!("{err:#}");
    match (policy, phase) {
        (FailurePolicy::Skip, _) => {
            report.push(resource, StepStatus::Failed(reason));
            Ok(())
        }
        (FailurePolicy::Abort, Phase::Capture) => Err(Error::CaptureFailed {
            resource: resource.to_string(),
            reason,
        }
        .into()),
        (FailurePolicy::Abort, Phase::Restore) => Err(Error::RestoreFailed {
            resource: resource.to_string(),
            reason,
        }
        .into()),
    }
}
