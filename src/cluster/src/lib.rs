//! Grid'5000 container-cluster bootstrap
//!
//! Turns reserved Grid'5000 nodes into members of a container-engine cluster.
//! For each node the [`NodeProvisioner`] leases the machine, installs the
//! engine with the right options, registers the node in the cluster's static
//! name table and enrolls it into the configured clustering control plane
//! (standalone coordinator mode or built-in consensus mode) and overlay network.
//!
//! Machine provisioning, resolver updates, coordination store, overlay network
//! and the built-in control plane are external; they are reached through the
//! traits in [`collaborators`].

pub mod auth;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod hosts;
pub mod node;
pub mod orchestrator;
pub mod progress;
pub mod role;
pub mod standalone;

pub use auth::{AuthOptions, MachineStore};
pub use collaborators::{
    BuiltinControlPlane, Collaborators, CoordinationStore, NameTableWriter, OverlayNetwork,
    ProvisioningBackend,
};
pub use config::{
    BuiltinConfig, ClusterConfig, ClusterFile, ClusterSettings, ClusteringMode, EngineSettings,
    G5kSettings,
};
pub use controller::{ClusterProvisioner, ClusterReport};
pub use descriptor::{G5kDescriptor, G5K_DRIVER};
pub use error::{CollaboratorError, ConfigError, NameTableError, ProvisionError, ProvisionFailure};
pub use host::{EngineOptions, Host, HostOptions};
pub use hosts::HostsLookupTable;
pub use node::{Node, NodeSpec, PlannedStep};
pub use orchestrator::{Enrollment, NodeProvisioner, ProvisionReport, Stage};
pub use progress::{ChannelProgressReporter, ProgressReporter, ProvisionProgress};
pub use role::{is_master, MasterSet, Role};
pub use standalone::{StandaloneConfig, SwarmOptions};
