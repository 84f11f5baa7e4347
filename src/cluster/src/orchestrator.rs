//! Per-node bootstrap orchestrator.
//!
//! Drives one node from reservation parameters to a cluster member:
//!
//! ```text
//! Pending -> Built -> Acquired -> Decorated -> Created -> NameRegistered
//!         -> {StandaloneEnrolled | BuiltinEnrolled | -} -> Done
//! ```
//!
//! Every step runs once. The first fatal error ends the call and is returned
//! with the last completed stage; nothing acquired earlier is released.
//!
//! Built-in clustering decides init vs. join from a cluster-wide predicate,
//! which races when several nodes start at once. Callers must run the
//! bootstrap node through initialization before provisioning any joiner (see
//! [`crate::controller::ClusterProvisioner`]).

use crate::auth::AuthOptions;
use crate::collaborators::Collaborators;
use crate::config::ClusteringMode;
use crate::descriptor::G5K_DRIVER;
use crate::error::{NameTableError, ProvisionError, ProvisionFailure};
use crate::host::Host;
use crate::node::Node;
use crate::progress::{ProgressReporter, ProvisionProgress};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bootstrap pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing done yet.
    Pending,
    /// Driver descriptor built and encoded.
    Built,
    /// Backend returned a host handle.
    Acquired,
    /// Engine, auth and clustering options attached.
    Decorated,
    /// Engine provisioned on the machine.
    Created,
    /// Address recorded and pushed to the host's resolver.
    NameRegistered,
    StandaloneEnrolled,
    BuiltinEnrolled,
    Done,
}

impl Stage {
    pub fn percentage(&self) -> u32 {
        match self {
            Stage::Pending => 0,
            Stage::Built => 5,
            Stage::Acquired => 15,
            Stage::Decorated => 20,
            Stage::Created => 75,
            Stage::NameRegistered => 85,
            Stage::StandaloneEnrolled | Stage::BuiltinEnrolled => 95,
            Stage::Done => 100,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Built => "built",
            Stage::Acquired => "acquired",
            Stage::Decorated => "decorated",
            Stage::Created => "created",
            Stage::NameRegistered => "name-registered",
            Stage::StandaloneEnrolled => "standalone-enrolled",
            Stage::BuiltinEnrolled => "builtin-enrolled",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// How the node entered the clustering control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enrollment {
    /// No clustering configured.
    None,
    /// Standalone options attached and post-creation steps run.
    Standalone,
    /// This node initialized the built-in cluster.
    Initialized,
    /// This node joined an existing built-in cluster.
    Joined,
}

/// Successful `provision` result.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub host: Host,
    pub role: Role,
    pub enrollment: Enrollment,
}

/// Runs the bootstrap pipeline for individual nodes.
#[derive(Clone)]
pub struct NodeProvisioner {
    collaborators: Collaborators,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl NodeProvisioner {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            progress: None,
        }
    }

    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Provision `node`: lease, install, register, enroll.
    pub async fn provision(&self, node: &Node) -> Result<ProvisionReport, ProvisionFailure> {
        tracing::info!(
            "[NodeProvisioner] Provisioning {} ({} on {}, job {}) as {}",
            node.machine_name(),
            node.node_name(),
            node.spec().site,
            node.spec().job_id,
            node.role()
        );

        let start = std::time::Instant::now();
        let mut stage = Stage::Pending;
        let mut recorded = None;

        match self.run(node, &mut stage, &mut recorded).await {
            Ok(report) => {
                tracing::info!(
                    "[TIMING] Node {} provisioned in {}ms",
                    node.machine_name(),
                    start.elapsed().as_millis()
                );
                Ok(report)
            }
            Err(error) => {
                tracing::error!(
                    "[NodeProvisioner] Node {} failed after stage '{}' ({}ms): {}",
                    node.machine_name(),
                    stage,
                    start.elapsed().as_millis(),
                    error
                );
                // A failed node is not a cluster member.
                if let Some(address) = recorded {
                    if node.cluster().hosts().remove(node.machine_name(), &address) {
                        tracing::info!(
                            "[NodeProvisioner] Withdrew {} -> {} from hosts lookup table",
                            node.machine_name(),
                            address
                        );
                    }
                }
                Err(ProvisionFailure {
                    machine_name: node.machine_name().to_string(),
                    last_completed: stage,
                    error,
                })
            }
        }
    }

    async fn run(
        &self,
        node: &Node,
        stage: &mut Stage,
        recorded: &mut Option<String>,
    ) -> Result<ProvisionReport, ProvisionError> {
        let cluster = node.cluster();
        let machine_name = node.machine_name();
        let c = &self.collaborators;

        let descriptor = node.descriptor().encode()?;
        self.advance(node, stage, Stage::Built, "Driver descriptor built");

        let mut host = c
            .backend
            .new_host(G5K_DRIVER, &descriptor)
            .await
            .map_err(ProvisionError::Backend)?;
        self.advance(node, stage, Stage::Acquired, "Host acquired");

        let engine = &mut host.options.engine;
        engine.arbitrary_flags = node.spec().engine_opts.clone();
        engine.labels = node.spec().engine_labels.clone();
        engine.install_url = cluster.engine_install_url().to_string();

        host.options.auth = Some(AuthOptions::for_machine(cluster.store(), machine_name));

        if let Some(standalone) = cluster.clustering().standalone() {
            host.options.swarm =
                Some(standalone.node_config(node.node_name(), node.is_master(), true));
        }

        // Flags are frozen into the engine's launch config by `create`.
        if let Some(flags) = node.cluster_store_flags() {
            host.options.engine.arbitrary_flags.extend(flags);
        }
        self.advance(node, stage, Stage::Decorated, "Host options set");

        c.backend
            .create(&mut host)
            .await
            .map_err(ProvisionError::Backend)?;
        self.advance(node, stage, Stage::Created, "Engine installed");

        let address = host.address.clone().ok_or_else(|| {
            ProvisionError::Registration(Box::new(NameTableError::MissingAddress(
                machine_name.to_string(),
            )))
        })?;
        cluster
            .hosts()
            .record(machine_name, &address)
            .map_err(|e| ProvisionError::Registration(Box::new(e)))?;
        *recorded = Some(address);
        c.name_table
            .register(&host, cluster.hosts())
            .await
            .map_err(ProvisionError::Registration)?;
        self.advance(node, stage, Stage::NameRegistered, "Registered in hosts lookup table");

        let enrollment = match cluster.clustering() {
            ClusteringMode::Standalone(standalone) => {
                if node.runs_coordination_store() {
                    tracing::info!(
                        "[NodeProvisioner] Starting coordination store on master {}",
                        machine_name
                    );
                    c.coordination_store.start(&host, cluster.masters()).await;
                }

                if node.joins_overlay() {
                    c.overlay
                        .join(&host)
                        .await
                        .map_err(ProvisionError::Network)?;
                    c.overlay
                        .join_discovery(&host, &standalone.discovery)
                        .await
                        .map_err(ProvisionError::Network)?;
                }

                self.advance(node, stage, Stage::StandaloneEnrolled, "Standalone clustering ready");
                Enrollment::Standalone
            }
            ClusteringMode::Builtin(builtin) => {
                let enrollment = if !c.control_plane.is_initialized().await {
                    tracing::info!(
                        "[NodeProvisioner] {} initializes the built-in cluster",
                        machine_name
                    );
                    c.control_plane
                        .init(&host, builtin)
                        .await
                        .map_err(ProvisionError::Clustering)?;
                    Enrollment::Initialized
                } else {
                    tracing::info!(
                        "[NodeProvisioner] {} joins the built-in cluster as {}",
                        machine_name,
                        node.role()
                    );
                    c.control_plane
                        .join(&host, builtin, node.is_master())
                        .await
                        .map_err(ProvisionError::Clustering)?;
                    Enrollment::Joined
                };
                self.advance(node, stage, Stage::BuiltinEnrolled, "Built-in clustering ready");
                enrollment
            }
            ClusteringMode::None => Enrollment::None,
        };

        self.advance(node, stage, Stage::Done, "Node ready");

        Ok(ProvisionReport {
            host,
            role: node.role(),
            enrollment,
        })
    }

    fn advance(&self, node: &Node, stage: &mut Stage, next: Stage, message: &str) {
        *stage = next;
        tracing::debug!(
            "[NodeProvisioner] {}: {} ({})",
            node.machine_name(),
            message,
            next
        );
        if let Some(reporter) = &self.progress {
            reporter.emit(ProvisionProgress::new(node.machine_name(), next, message));
        }
    }
}
