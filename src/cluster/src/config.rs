//! Cluster configuration
//! Loaded from a cluster TOML file, validated once, then shared read-only by every node.

use crate::auth::MachineStore;
use crate::error::ConfigError;
use crate::hosts::HostsLookupTable;
use crate::node::{Node, NodeSpec};
use crate::role::MasterSet;
use crate::standalone::StandaloneConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_image() -> String {
    "jessie-x64-min".to_string()
}

fn default_walltime() -> String {
    "1:00:00".to_string()
}

fn default_install_url() -> String {
    "https://get.docker.com".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:2377".to_string()
}

/// Cluster file: cluster-wide settings plus the nodes to provision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterFile {
    pub cluster: ClusterSettings,

    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

impl ClusterFile {
    /// Load a cluster file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: ClusterFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(
            "[ClusterConfig] Loaded cluster file {:?} ({} nodes)",
            path,
            file.nodes.len()
        );
        Ok(file)
    }

    /// Validate the settings and bind every node spec to the shared config.
    pub fn into_nodes(self) -> Result<(Arc<ClusterConfig>, Vec<Node>), ConfigError> {
        let config = Arc::new(ClusterConfig::try_from(self.cluster)?);

        let mut seen = HashSet::new();
        for spec in &self.nodes {
            if !seen.insert(spec.machine_name.as_str()) {
                return Err(ConfigError::DuplicateMachine(spec.machine_name.clone()));
            }
        }

        let nodes = self
            .nodes
            .into_iter()
            .map(|spec| Node::new(Arc::clone(&config), spec))
            .collect();
        Ok((config, nodes))
    }
}

/// Cluster-wide settings as written in the cluster file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    pub g5k: G5kSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    /// Machine names of clustering masters.
    #[serde(default)]
    pub master_nodes: Vec<String>,

    /// Back engine cluster storage with the coordination store (standalone only).
    #[serde(default)]
    pub coordination_storage: bool,

    #[serde(default)]
    pub overlay_networking: bool,

    #[serde(default)]
    pub standalone: Option<StandaloneConfig>,

    #[serde(default)]
    pub builtin: Option<BuiltinConfig>,

    /// Machine store root, defaults to `$MACHINE_STORAGE_PATH` or `~/.docker/machine`.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl ClusterSettings {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        ssh_key_pair: impl Into<String>,
    ) -> Self {
        Self {
            g5k: G5kSettings {
                username: username.into(),
                password: password.into(),
                image: default_image(),
                walltime: default_walltime(),
                ssh_key_pair: ssh_key_pair.into(),
            },
            engine: EngineSettings::default(),
            master_nodes: Vec::new(),
            coordination_storage: false,
            overlay_networking: false,
            standalone: None,
            builtin: None,
            store_path: None,
        }
    }
}

/// Grid'5000 account and reservation parameters.
#[derive(Clone, Serialize, Deserialize)]
pub struct G5kSettings {
    pub username: String,
    pub password: String,

    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_walltime")]
    pub walltime: String,

    /// SSH key pair installed on deployed nodes.
    pub ssh_key_pair: String,
}

impl std::fmt::Debug for G5kSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("G5kSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("image", &self.image)
            .field("walltime", &self.walltime)
            .field("ssh_key_pair", &self.ssh_key_pair)
            .finish()
    }
}

/// Engine installation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_install_url")]
    pub install_url: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            install_url: default_install_url(),
        }
    }
}

/// Built-in (consensus) clustering settings, passed through to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Address advertised to peers; the control plane picks one when unset.
    #[serde(default)]
    pub advertise_addr: Option<String>,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            advertise_addr: None,
        }
    }
}

/// Clustering control plane the cluster is enrolled into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusteringMode {
    None,
    Standalone(StandaloneConfig),
    Builtin(BuiltinConfig),
}

impl ClusteringMode {
    pub fn standalone(&self) -> Option<&StandaloneConfig> {
        match self {
            ClusteringMode::Standalone(config) => Some(config),
            _ => None,
        }
    }

    pub fn builtin(&self) -> Option<&BuiltinConfig> {
        match self {
            ClusteringMode::Builtin(config) => Some(config),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClusteringMode::None => "none",
            ClusteringMode::Standalone(_) => "standalone",
            ClusteringMode::Builtin(_) => "builtin",
        }
    }
}

/// Validated cluster configuration.
///
/// Built once before any node is provisioned and shared behind an `Arc`.
/// Only the hosts lookup table changes afterwards, through its own lock.
#[derive(Debug)]
pub struct ClusterConfig {
    g5k: G5kSettings,
    engine_install_url: String,
    masters: MasterSet,
    hosts: HostsLookupTable,
    coordination_storage: bool,
    overlay_networking: bool,
    clustering: ClusteringMode,
    store: MachineStore,
}

impl TryFrom<ClusterSettings> for ClusterConfig {
    type Error = ConfigError;

    fn try_from(settings: ClusterSettings) -> Result<Self, Self::Error> {
        if settings.g5k.username.is_empty() {
            return Err(ConfigError::Missing("g5k.username"));
        }
        if settings.g5k.image.is_empty() {
            return Err(ConfigError::Missing("g5k.image"));
        }
        if settings.g5k.walltime.is_empty() {
            return Err(ConfigError::Missing("g5k.walltime"));
        }

        let clustering = match (settings.standalone, settings.builtin) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingClusteringModes),
            (Some(standalone), None) => ClusteringMode::Standalone(standalone),
            (None, Some(builtin)) => ClusteringMode::Builtin(builtin),
            (None, None) => ClusteringMode::None,
        };

        if settings.coordination_storage && clustering.standalone().is_none() {
            return Err(ConfigError::StorageWithoutStandalone);
        }
        if settings.overlay_networking && clustering.standalone().is_none() {
            tracing::warn!(
                "[ClusterConfig] Overlay networking only applies to standalone clustering, ignored in '{}' mode",
                clustering.name()
            );
        }

        let store = settings
            .store_path
            .map(MachineStore::new)
            .unwrap_or_default();

        Ok(Self {
            g5k: settings.g5k,
            engine_install_url: settings.engine.install_url,
            masters: MasterSet::new(settings.master_nodes),
            hosts: HostsLookupTable::new(),
            coordination_storage: settings.coordination_storage,
            overlay_networking: settings.overlay_networking,
            clustering,
            store,
        })
    }
}

impl ClusterConfig {
    pub fn g5k(&self) -> &G5kSettings {
        &self.g5k
    }

    pub fn engine_install_url(&self) -> &str {
        &self.engine_install_url
    }

    pub fn masters(&self) -> &MasterSet {
        &self.masters
    }

    pub fn hosts(&self) -> &HostsLookupTable {
        &self.hosts
    }

    pub fn coordination_storage(&self) -> bool {
        self.coordination_storage
    }

    pub fn overlay_networking(&self) -> bool {
        self.overlay_networking
    }

    pub fn clustering(&self) -> &ClusteringMode {
        &self.clustering
    }

    pub fn store(&self) -> &MachineStore {
        &self.store
    }
}
