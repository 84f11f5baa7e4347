//! Cluster-level provisioning.
//!
//! Runs `NodeProvisioner::provision` for every node of a cluster, one task per
//! node. Under built-in clustering the bootstrap node is provisioned to
//! completion first, so every other node observes an initialized cluster and
//! joins it instead of racing to initialize.
//!
//! The hosts lookup table grows as nodes register, so hosts registered early
//! only hold the peers known at that point. Once every node has finished, the
//! complete table is pushed again to each provisioned host.

use crate::config::ClusteringMode;
use crate::error::ProvisionFailure;
use crate::node::Node;
use crate::orchestrator::{NodeProvisioner, ProvisionReport};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of a cluster build, per machine name.
#[derive(Debug, Default)]
pub struct ClusterReport {
    pub provisioned: BTreeMap<String, ProvisionReport>,
    pub failed: BTreeMap<String, ProvisionFailure>,
    /// Nodes that never ran to completion: not started after a failed
    /// bootstrap node, or whose task was aborted.
    pub skipped: Vec<String>,
    /// Provisioned nodes that did not receive the final hosts lookup table.
    pub unsynced: Vec<String>,
}

impl ClusterReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.unsynced.is_empty()
    }

    fn record(&mut self, machine_name: String, result: Result<ProvisionReport, ProvisionFailure>) {
        match result {
            Ok(report) => {
                self.provisioned.insert(machine_name, report);
            }
            Err(failure) => {
                self.failed.insert(machine_name, failure);
            }
        }
    }
}

pub struct ClusterProvisioner {
    provisioner: Arc<NodeProvisioner>,
}

impl ClusterProvisioner {
    pub fn new(provisioner: NodeProvisioner) -> Self {
        Self {
            provisioner: Arc::new(provisioner),
        }
    }

    /// Node that initializes a built-in cluster: the first master, else the
    /// first node.
    pub fn bootstrap_index(nodes: &[Node]) -> Option<usize> {
        nodes
            .iter()
            .position(Node::is_master)
            .or_else(|| (!nodes.is_empty()).then_some(0))
    }

    /// Provision every node. A failed node does not stop its peers, except a
    /// failed built-in bootstrap node, which leaves the rest unstarted.
    pub async fn provision_all(&self, mut nodes: Vec<Node>) -> ClusterReport {
        let mut report = ClusterReport::default();
        let Some(first) = nodes.first() else {
            return report;
        };

        let anchor = first.clone();
        let start = std::time::Instant::now();
        let builtin = matches!(anchor.cluster().clustering(), ClusteringMode::Builtin(_));

        if builtin {
            if let Some(index) = Self::bootstrap_index(&nodes) {
                let bootstrap = nodes.remove(index);
                tracing::info!(
                    "[ClusterProvisioner] Provisioning bootstrap node {} before {} joiners",
                    bootstrap.machine_name(),
                    nodes.len()
                );
                let result = self.provisioner.provision(&bootstrap).await;
                let failed = result.is_err();
                report.record(bootstrap.machine_name().to_string(), result);
                if failed {
                    tracing::error!(
                        "[ClusterProvisioner] Bootstrap node {} failed, not starting remaining nodes",
                        bootstrap.machine_name()
                    );
                    report.skipped = nodes.iter().map(|n| n.machine_name().to_string()).collect();
                    return report;
                }
            }
        }

        let mut pending: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut tasks = JoinSet::new();
        for node in nodes {
            let machine_name = node.machine_name().to_string();
            let provisioner = Arc::clone(&self.provisioner);
            let handle = tasks.spawn(async move {
                let result = provisioner.provision(&node).await;
                (node.machine_name().to_string(), result)
            });
            pending.insert(handle.id(), machine_name);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((machine_name, result)) => {
                    pending.retain(|_, pending_name| *pending_name != machine_name);
                    report.record(machine_name, result);
                }
                Err(e) => {
                    let machine_name = pending.get(&e.id()).map_or("<unknown>", String::as_str);
                    tracing::error!(
                        "[ClusterProvisioner] Provisioning task for {} aborted: {}",
                        machine_name,
                        e
                    );
                }
            }
        }
        let mut aborted: Vec<String> = pending.into_values().collect();
        aborted.sort();
        report.skipped.extend(aborted);

        self.sync_name_tables(&anchor, &mut report).await;

        tracing::info!(
            "[TIMING] Cluster provisioned in {}ms ({} ok, {} failed, {} skipped, {} unsynced)",
            start.elapsed().as_millis(),
            report.provisioned.len(),
            report.failed.len(),
            report.skipped.len(),
            report.unsynced.len()
        );
        report
    }

    /// Push the complete hosts lookup table to every provisioned host.
    async fn sync_name_tables(&self, anchor: &Node, report: &mut ClusterReport) {
        let table = anchor.cluster().hosts();
        let writer = &self.provisioner.collaborators().name_table;
        for (machine_name, provisioned) in &report.provisioned {
            if let Err(e) = writer.register(&provisioned.host, table).await {
                tracing::warn!(
                    "[ClusterProvisioner] Failed to push {} hosts entries to {}: {}",
                    table.len(),
                    machine_name,
                    e
                );
                report.unsynced.push(machine_name.clone());
            }
        }
    }
}
