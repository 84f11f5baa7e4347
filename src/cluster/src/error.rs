//! Error types for cluster configuration and node provisioning.

use crate::orchestrator::Stage;

/// Error returned by an external collaborator (backend, name table, overlay,
/// control plane). Kept intact as the `source` of a [`ProvisionError`] so the
/// caller can downcast to the collaborator's own type.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[source] CollaboratorError),

    #[error("Registration error: {0}")]
    Registration(#[source] CollaboratorError),

    #[error("Clustering error: {0}")]
    Clustering(#[source] CollaboratorError),

    #[error("Network error: {0}")]
    Network(#[source] CollaboratorError),
}

impl ProvisionError {
    /// The collaborator error this failure was raised from, if any.
    pub fn collaborator_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ProvisionError::Descriptor(_) => None,
            ProvisionError::Backend(e)
            | ProvisionError::Registration(e)
            | ProvisionError::Clustering(e)
            | ProvisionError::Network(e) => Some(e.as_ref()),
        }
    }
}

/// A failed `provision` call: which node, how far it got, and why it stopped.
///
/// Nothing acquired before `last_completed` is torn down; reconciling a
/// half-provisioned machine is the caller's job.
#[derive(Debug, thiserror::Error)]
#[error("provisioning of '{machine_name}' failed after stage {last_completed}: {error}")]
pub struct ProvisionFailure {
    pub machine_name: String,
    pub last_completed: Stage,
    #[source]
    pub error: ProvisionError,
}

/// Errors raised while loading or validating cluster configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Standalone and built-in clustering cannot both be configured")]
    ConflictingClusteringModes,

    #[error("Coordination storage requires standalone clustering (it is the discovery backend)")]
    StorageWithoutStandalone,

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Duplicate machine name: {0}")]
    DuplicateMachine(String),
}

/// Errors raised by the shared hosts lookup table.
#[derive(Debug, thiserror::Error)]
pub enum NameTableError {
    #[error("'{name}' is already registered with address {existing}, refusing {requested}")]
    Conflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("Host '{0}' has no address to register")]
    MissingAddress(String),
}
