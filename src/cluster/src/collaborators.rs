//! Capabilities the orchestrator consumes from the outside world.
//!
//! None of these are implemented here: leasing and installing machines,
//! pushing resolver entries, running the coordination store, joining the
//! overlay network and driving the built-in control plane all belong to other
//! components. Implementations must be safe to call from several nodes at once.

use crate::config::BuiltinConfig;
use crate::error::CollaboratorError;
use crate::host::Host;
use crate::hosts::HostsLookupTable;
use crate::role::MasterSet;
use async_trait::async_trait;
use std::sync::Arc;

/// Leases machines and installs the engine on them.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Instantiate a host for `driver_name` from an encoded descriptor.
    /// Nothing is provisioned yet; the handle can still be modified.
    async fn new_host(&self, driver_name: &str, descriptor: &[u8]) -> Result<Host, CollaboratorError>;

    /// Durably provision `host` with its current options. May fill in
    /// `host.address`.
    async fn create(&self, host: &mut Host) -> Result<(), CollaboratorError>;
}

/// Pushes the cluster name table onto a host.
#[async_trait]
pub trait NameTableWriter: Send + Sync {
    async fn register(&self, host: &Host, table: &HostsLookupTable) -> Result<(), CollaboratorError>;
}

/// Starts the coordination-store role on master hosts.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Fire-and-forget: failures are the implementation's to log.
    async fn start(&self, host: &Host, masters: &MasterSet);
}

/// Overlay network used for cross-host container traffic.
#[async_trait]
pub trait OverlayNetwork: Send + Sync {
    async fn join(&self, host: &Host) -> Result<(), CollaboratorError>;

    /// Requires a prior successful `join` on the same host.
    async fn join_discovery(&self, host: &Host, discovery: &str) -> Result<(), CollaboratorError>;
}

/// Built-in (consensus) clustering control plane.
#[async_trait]
pub trait BuiltinControlPlane: Send + Sync {
    /// Cluster-wide: true once any node has initialized the cluster.
    async fn is_initialized(&self) -> bool;

    async fn init(&self, host: &Host, config: &BuiltinConfig) -> Result<(), CollaboratorError>;

    async fn join(
        &self,
        host: &Host,
        config: &BuiltinConfig,
        is_master: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Collaborator set shared by every node of a cluster.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn ProvisioningBackend>,
    pub name_table: Arc<dyn NameTableWriter>,
    pub coordination_store: Arc<dyn CoordinationStore>,
    pub overlay: Arc<dyn OverlayNetwork>,
    pub control_plane: Arc<dyn BuiltinControlPlane>,
}
