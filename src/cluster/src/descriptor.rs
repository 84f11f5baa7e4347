//! Driver descriptor handed to the provisioning backend.

use crate::error::ProvisionError;
use serde::Serialize;
use std::path::PathBuf;

/// Driver kind the backend instantiates for Grid'5000 reservations.
pub const G5K_DRIVER: &str = "g5k";

/// Parameters of the Grid'5000 machine driver, encoded as JSON for the backend.
///
/// Field names follow the driver's own JSON keys.
#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct G5kDescriptor {
    pub g5k_username: String,
    pub g5k_password: String,
    pub g5k_site: String,
    pub g5k_image: String,
    pub g5k_walltime: String,
    #[serde(rename = "G5kJobID")]
    pub g5k_job_id: u64,
    pub g5k_host_to_provision: String,
    #[serde(rename = "SSHKeyPair")]
    pub ssh_key_pair: String,
    pub g5k_skip_vpn_checks: bool,
    pub machine_name: String,
    pub store_path: PathBuf,
    #[serde(rename = "SSHKeyPath")]
    pub ssh_key_path: PathBuf,
}

impl G5kDescriptor {
    pub fn encode(&self) -> Result<Vec<u8>, ProvisionError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl std::fmt::Debug for G5kDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("G5kDescriptor")
            .field("g5k_username", &self.g5k_username)
            .field("g5k_password", &"<redacted>")
            .field("g5k_site", &self.g5k_site)
            .field("g5k_image", &self.g5k_image)
            .field("g5k_walltime", &self.g5k_walltime)
            .field("g5k_job_id", &self.g5k_job_id)
            .field("g5k_host_to_provision", &self.g5k_host_to_provision)
            .field("machine_name", &self.machine_name)
            .field("store_path", &self.store_path)
            .finish_non_exhaustive()
    }
}
