//! Progress reporting for node provisioning.

use crate::orchestrator::Stage;
use serde::{Deserialize, Serialize};

/// Progress of one node through the bootstrap pipeline.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ProvisionProgress {
    pub machine_name: String,
    pub stage: Stage,
    pub percentage: u32,
    pub message: String,
}

impl ProvisionProgress {
    pub fn new(machine_name: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
            stage,
            percentage: stage.percentage(),
            message: message.into(),
        }
    }
}

/// Progress reporter for provisioning operations.
pub trait ProgressReporter: Send + Sync + 'static {
    fn emit(&self, progress: ProvisionProgress);
}

/// Channel-based progress reporter.
///
/// Uses `try_send`: a full or closed channel drops the update rather than
/// stalling the node.
pub struct ChannelProgressReporter {
    sender: tokio::sync::mpsc::Sender<ProvisionProgress>,
}

impl ChannelProgressReporter {
    pub fn new(sender: tokio::sync::mpsc::Sender<ProvisionProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn emit(&self, progress: ProvisionProgress) {
        let _ = self.sender.try_send(progress);
    }
}
