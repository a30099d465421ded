//! Host layout and service names, with defaults matching a stock master node.
//!
//! Every field is optional in the JSON form; anything omitted keeps its default.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{guard::DEFAULT_LOCK_FILE, Error, Result};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub lock_file: PathBuf,
    pub database: DatabaseSettings,
    pub kv_store: KvStoreSettings,
    pub ssh_key: PathBuf,
    pub known_tokens: PathBuf,
    pub node_configfile: PathBuf,
    pub license: PathBuf,
    pub proxy_config_dir: PathBuf,
    pub services: ServiceSettings,
    /// Program plus arguments run after a nodeless restore.
    pub cleanup_command: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lock_file: PathBuf::from(DEFAULT_LOCK_FILE),
            database: DatabaseSettings::default(),
            kv_store: KvStoreSettings::default(),
            ssh_key: PathBuf::from("/var/lib/nginx/.ssh/id_rsa"),
            known_tokens: PathBuf::from("/etc/kubernetes/known_tokens.csv"),
            node_configfile: PathBuf::from("/etc/kubernetes/configfile_for_nodes"),
            license: PathBuf::from("/var/opt/kuberdock/.license"),
            proxy_config_dir: PathBuf::from("/etc/nginx/conf.d/"),
            services: ServiceSettings::default(),
            cleanup_command: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub name: String,
    pub user: String,
    pub schema: String,
    /// OS account the tools run as (via `sudo -u`) and that owns the restore input.
    pub os_user: Option<String>,
    pub niceness: Option<i32>,
    pub dump_program: String,
    pub restore_program: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: "kuberdock".into(),
            user: "postgres".into(),
            schema: "public".into(),
            os_user: Some("postgres".into()),
            niceness: Some(19),
            dump_program: "pg_dump".into(),
            restore_program: "pg_restore".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KvStoreSettings {
    pub data_dir: PathBuf,
    pub pki_dir: PathBuf,
    /// Account that receives ownership of the restored data directory.
    pub owner: Option<String>,
}

impl Default for KvStoreSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/etcd/default.etcd/member/"),
            pki_dir: PathBuf::from("/etc/pki/etcd/"),
            owner: Some("etcd".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    pub database: String,
    pub kv_store: String,
    pub api_server: String,
    pub proxy: String,
    pub app_server: String,
    /// Pause between starting the store and the API server.
    pub settle_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            database: "postgresql".into(),
            kv_store: "etcd".into(),
            api_server: "kube-apiserver".into(),
            proxy: "nginx".into(),
            app_server: "emperor.uwsgi".into(),
            settle_secs: 5,
        }
    }
}

impl ServiceSettings {
    pub fn settle_interval(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

impl Settings {
    /// Defaults, optionally overridden by a JSON file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            None => Self::default(),
            Some(path) => {
                let bytes = fs::read(path).map_err(|err| {
                    Error::Config(format!("cannot read {}: {err}", path.display()))
                })?;
                serde_json::from_slice(&bytes).map_err(Error::from)?
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.name.is_empty() {
            return Err(Error::Config("database.name must not be empty".into()).into());
        }
        if let Some(cmd) = &self.cleanup_command {
            if cmd.is_empty() {
                return Err(Error::Config("cleanup_command must name a program".into()).into());
            }
        }
        Ok(())
    }
}
