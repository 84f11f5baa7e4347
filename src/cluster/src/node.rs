//! Cluster member description and its bootstrap plan.

use crate::config::{ClusterConfig, ClusteringMode};
use crate::descriptor::G5kDescriptor;
use crate::role::{self, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Node as written in the cluster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Machine name, unique within the cluster.
    pub machine_name: String,

    /// Grid'5000 hostname of the reserved node.
    pub node_name: String,

    pub site: String,

    /// Reservation holding the node.
    pub job_id: u64,

    #[serde(default)]
    pub engine_opts: Vec<String>,

    #[serde(default)]
    pub engine_labels: Vec<String>,
}

/// One cluster member, bound to the shared cluster configuration.
#[derive(Debug, Clone)]
pub struct Node {
    cluster: Arc<ClusterConfig>,
    spec: NodeSpec,
}

impl Node {
    pub fn new(cluster: Arc<ClusterConfig>, spec: NodeSpec) -> Self {
        Self { cluster, spec }
    }

    pub fn cluster(&self) -> &ClusterConfig {
        &self.cluster
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn machine_name(&self) -> &str {
        &self.spec.machine_name
    }

    pub fn node_name(&self) -> &str {
        &self.spec.node_name
    }

    pub fn is_master(&self) -> bool {
        role::is_master(&self.spec.machine_name, self.cluster.masters())
    }

    pub fn role(&self) -> Role {
        Role::of(&self.spec.machine_name, self.cluster.masters())
    }

    /// Driver parameters for this node's reservation.
    pub fn descriptor(&self) -> G5kDescriptor {
        let g5k = self.cluster.g5k();
        let store = self.cluster.store();
        G5kDescriptor {
            g5k_username: g5k.username.clone(),
            g5k_password: g5k.password.clone(),
            g5k_site: self.spec.site.clone(),
            g5k_image: g5k.image.clone(),
            g5k_walltime: g5k.walltime.clone(),
            g5k_job_id: self.spec.job_id,
            g5k_host_to_provision: self.spec.node_name.clone(),
            ssh_key_pair: g5k.ssh_key_pair.clone(),
            g5k_skip_vpn_checks: true,
            machine_name: self.spec.machine_name.clone(),
            store_path: store.root().to_path_buf(),
            ssh_key_path: store.ssh_key_path(&self.spec.machine_name),
        }
    }

    /// `cluster-advertise` / `cluster-store` engine flags, when coordination
    /// storage backs the engine's cluster store.
    pub fn cluster_store_flags(&self) -> Option<[String; 2]> {
        if !self.cluster.coordination_storage() {
            return None;
        }
        let standalone = self.cluster.clustering().standalone()?;
        Some([
            format!("cluster-advertise={}", standalone.advertise),
            format!("cluster-store={}", standalone.discovery),
        ])
    }

    pub(crate) fn runs_coordination_store(&self) -> bool {
        self.cluster.clustering().standalone().is_some()
            && self.cluster.coordination_storage()
            && self.is_master()
    }

    pub(crate) fn joins_overlay(&self) -> bool {
        self.cluster.clustering().standalone().is_some() && self.cluster.overlay_networking()
    }

    /// Steps `provision` will run for this node, in order.
    pub fn plan(&self) -> Vec<PlannedStep> {
        let clustering = self.cluster.clustering();
        let mut steps = vec![
            PlannedStep::BuildDescriptor,
            PlannedStep::AcquireHost,
            PlannedStep::DecorateHost {
                standalone: clustering.standalone().is_some(),
            },
        ];
        if self.cluster_store_flags().is_some() {
            steps.push(PlannedStep::InjectStoreFlags);
        }
        steps.push(PlannedStep::CreateHost);
        steps.push(PlannedStep::RegisterName);

        match clustering {
            ClusteringMode::Standalone(_) => {
                if self.runs_coordination_store() {
                    steps.push(PlannedStep::StartCoordinationStore);
                }
                if self.joins_overlay() {
                    steps.push(PlannedStep::JoinOverlay);
                    steps.push(PlannedStep::JoinOverlayDiscovery);
                }
            }
            ClusteringMode::Builtin(_) => steps.push(PlannedStep::EnrollBuiltin {
                is_master: self.is_master(),
            }),
            ClusteringMode::None => {}
        }
        steps
    }
}

/// A single bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedStep {
    BuildDescriptor,
    AcquireHost,
    DecorateHost { standalone: bool },
    InjectStoreFlags,
    CreateHost,
    RegisterName,
    StartCoordinationStore,
    JoinOverlay,
    JoinOverlayDiscovery,
    /// Initialize the built-in cluster, or join it if already initialized.
    EnrollBuiltin { is_master: bool },
}

impl std::fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannedStep::BuildDescriptor => write!(f, "build driver descriptor"),
            PlannedStep::AcquireHost => write!(f, "acquire host"),
            PlannedStep::DecorateHost { standalone: true } => {
                write!(f, "set engine, auth and standalone clustering options")
            }
            PlannedStep::DecorateHost { standalone: false } => {
                write!(f, "set engine and auth options")
            }
            PlannedStep::InjectStoreFlags => write!(f, "add cluster-advertise/cluster-store flags"),
            PlannedStep::CreateHost => write!(f, "create host"),
            PlannedStep::RegisterName => write!(f, "register in hosts lookup table"),
            PlannedStep::StartCoordinationStore => write!(f, "start coordination store"),
            PlannedStep::JoinOverlay => write!(f, "join overlay network"),
            PlannedStep::JoinOverlayDiscovery => write!(f, "join overlay discovery"),
            PlannedStep::EnrollBuiltin { is_master } => write!(
                f,
                "init built-in cluster, or join it as {}",
                if *is_master { "manager" } else { "worker" }
            ),
        }
    }
}
