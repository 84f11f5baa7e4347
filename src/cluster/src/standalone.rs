//! Standalone (coordinator-based) clustering configuration.
//!
//! In standalone mode every engine runs a clustering agent that registers with
//! an external discovery backend; masters additionally run the manager. The
//! per-node settings are a pure function of the cluster-wide config and the
//! node's identity.

use serde::{Deserialize, Serialize};

fn default_image() -> String {
    "swarm:latest".to_string()
}

fn default_strategy() -> String {
    "spread".to_string()
}

fn default_manager_host() -> String {
    "tcp://0.0.0.0:3376".to_string()
}

fn default_advertise() -> String {
    "eth0:2379".to_string()
}

fn default_engine_port() -> u16 {
    2376
}

/// Cluster-wide standalone clustering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandaloneConfig {
    /// Discovery backend URL (e.g. `zk://n1:2181,n2:2181/swarm`).
    pub discovery: String,

    #[serde(default = "default_image")]
    pub image: String,

    /// Manager scheduling strategy.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Address the manager listens on.
    #[serde(default = "default_manager_host")]
    pub manager_host: String,

    /// `cluster-advertise` value injected when coordination storage is enabled.
    #[serde(default = "default_advertise")]
    pub advertise: String,

    /// Engine TLS port agents advertise to the manager.
    #[serde(default = "default_engine_port")]
    pub engine_port: u16,

    #[serde(default)]
    pub master_flags: Vec<String>,

    #[serde(default)]
    pub join_flags: Vec<String>,
}

impl StandaloneConfig {
    pub fn new(discovery: impl Into<String>) -> Self {
        Self {
            discovery: discovery.into(),
            image: default_image(),
            strategy: default_strategy(),
            manager_host: default_manager_host(),
            advertise: default_advertise(),
            engine_port: default_engine_port(),
            master_flags: Vec::new(),
            join_flags: Vec::new(),
        }
    }

    /// Clustering options for one node.
    ///
    /// `ready` enables the agent right away; with `false` the options are
    /// attached but the backend leaves clustering off until asked.
    pub fn node_config(&self, node_name: &str, is_master: bool, ready: bool) -> SwarmOptions {
        let mut join_flags = self.join_flags.clone();
        join_flags.push(format!("advertise={}:{}", node_name, self.engine_port));

        SwarmOptions {
            is_swarm: ready,
            master: is_master,
            agent: true,
            discovery: self.discovery.clone(),
            image: self.image.clone(),
            strategy: self.strategy.clone(),
            host: self.manager_host.clone(),
            master_flags: if is_master {
                self.master_flags.clone()
            } else {
                Vec::new()
            },
            join_flags,
        }
    }
}

/// Per-host standalone clustering options attached before creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmOptions {
    pub is_swarm: bool,
    pub master: bool,
    pub agent: bool,
    pub discovery: String,
    pub image: String,
    pub strategy: String,
    pub host: String,
    pub master_flags: Vec<String>,
    pub join_flags: Vec<String>,
}
