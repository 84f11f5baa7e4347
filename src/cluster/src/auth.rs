//! Machine store layout and engine TLS material paths.
//!
//! The store is laid out by the provisioning backend, this crate only derives
//! paths from it:
//!
//! ```text
//! <root>/certs/{ca.pem, ca-key.pem, cert.pem, key.pem}
//! <root>/machines/<machine>/{server.pem, server-key.pem, id_rsa}
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the store root.
pub const STORE_PATH_ENV: &str = "MACHINE_STORAGE_PATH";

/// Root of the machine store shared with the provisioning backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineStore {
    root: PathBuf,
}

impl MachineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cert_dir(&self) -> PathBuf {
        self.root.join("certs")
    }

    pub fn machines_dir(&self) -> PathBuf {
        self.root.join("machines")
    }

    pub fn machine_dir(&self, machine_name: &str) -> PathBuf {
        self.machines_dir().join(machine_name)
    }

    /// Private key the driver uses to reach the machine over SSH.
    pub fn ssh_key_path(&self, machine_name: &str) -> PathBuf {
        self.machine_dir(machine_name).join("id_rsa")
    }
}

impl MachineStore {
    /// Store root from `$MACHINE_STORAGE_PATH`, else `<home>/.docker/machine`,
    /// else `/tmp/.docker/machine`.
    pub fn resolve(env_root: Option<std::ffi::OsString>, home: Option<PathBuf>) -> Self {
        if let Some(path) = env_root {
            return Self::new(path);
        }
        let home = home.unwrap_or_else(|| {
            tracing::warn!(
                "[MachineStore] No home directory and {} unset, using /tmp/.docker/machine; \
                 engine certificates are unlikely to be found there",
                STORE_PATH_ENV
            );
            PathBuf::from("/tmp")
        });
        Self::new(home.join(".docker").join("machine"))
    }
}

impl Default for MachineStore {
    fn default() -> Self {
        Self::resolve(std::env::var_os(STORE_PATH_ENV), dirs::home_dir())
    }
}

/// TLS material the engine is provisioned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
    pub cert_dir: PathBuf,
    pub ca_cert_path: PathBuf,
    pub ca_private_key_path: PathBuf,
    pub client_cert_path: PathBuf,
    pub client_key_path: PathBuf,
    pub server_cert_path: PathBuf,
    pub server_key_path: PathBuf,
    pub store_path: PathBuf,
    #[serde(default)]
    pub server_cert_sans: Vec<String>,
}

impl AuthOptions {
    /// Paths for `machine_name` under `store`.
    ///
    /// Must be set on every host before creation, otherwise the backend falls
    /// back to its own default locations and the certificates do not match.
    pub fn for_machine(store: &MachineStore, machine_name: &str) -> Self {
        let cert_dir = store.cert_dir();
        let machine_dir = store.machine_dir(machine_name);
        Self {
            ca_cert_path: cert_dir.join("ca.pem"),
            ca_private_key_path: cert_dir.join("ca-key.pem"),
            client_cert_path: cert_dir.join("cert.pem"),
            client_key_path: cert_dir.join("key.pem"),
            server_cert_path: machine_dir.join("server.pem"),
            server_key_path: machine_dir.join("server-key.pem"),
            store_path: machine_dir,
            cert_dir,
            server_cert_sans: Vec::new(),
        }
    }
}
