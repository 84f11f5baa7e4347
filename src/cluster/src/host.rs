//! Host handle returned by the provisioning backend.

use crate::auth::AuthOptions;
use crate::standalone::SwarmOptions;
use serde::{Deserialize, Serialize};

/// Engine launch options. Baked into the engine configuration at creation,
/// so everything here must be set before `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub arbitrary_flags: Vec<String>,
    pub labels: Vec<String>,
    pub install_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOptions {
    pub engine: EngineOptions,
    /// `None` until the orchestrator decorates the host.
    pub auth: Option<AuthOptions>,
    pub swarm: Option<SwarmOptions>,
}

/// A leased machine, mutable until it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub driver_name: String,
    /// Encoded driver descriptor handed to `new_host`.
    pub driver_data: Vec<u8>,
    pub options: HostOptions,
    /// Address reported by the backend, normally known once created.
    pub address: Option<String>,
}

impl Host {
    pub fn new(name: impl Into<String>, driver_name: impl Into<String>, driver_data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            driver_name: driver_name.into(),
            driver_data,
            options: HostOptions::default(),
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn has_engine_flag(&self, flag: &str) -> bool {
        self.options.engine.arbitrary_flags.iter().any(|f| f == flag)
    }
}
