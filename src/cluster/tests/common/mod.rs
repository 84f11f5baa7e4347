//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cluster::{
    BuiltinConfig, BuiltinControlPlane, ClusterConfig, ClusterSettings, CollaboratorError,
    Collaborators, CoordinationStore, Host, HostsLookupTable, MasterSet, NameTableWriter, Node,
    NodeSpec, OverlayNetwork, ProvisioningBackend, StandaloneConfig,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub const DISCOVERY: &str = "zk://n1:2181/swarm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NewHost { machine: String, driver: String },
    Create { machine: String, flags: Vec<String> },
    Register { machine: String },
    StartStore { machine: String, masters: Vec<String> },
    OverlayJoin { machine: String },
    DiscoveryJoin { machine: String, discovery: String },
    Init { machine: String },
    Join { machine: String, is_master: bool },
}

impl Call {
    pub fn machine(&self) -> &str {
        match self {
            Call::NewHost { machine, .. }
            | Call::Create { machine, .. }
            | Call::Register { machine }
            | Call::StartStore { machine, .. }
            | Call::OverlayJoin { machine }
            | Call::DiscoveryJoin { machine, .. }
            | Call::Init { machine }
            | Call::Join { machine, .. } => machine,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Call::NewHost { .. } => "new_host",
            Call::Create { .. } => "create",
            Call::Register { .. } => "register",
            Call::StartStore { .. } => "start_store",
            Call::OverlayJoin { .. } => "overlay_join",
            Call::DiscoveryJoin { .. } => "discovery_join",
            Call::Init { .. } => "init",
            Call::Join { .. } => "join",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("mock {0} failure")]
pub struct MockError(pub &'static str);

/// Records every collaborator call in order. Operations named in `fail_on`
/// return `MockError`.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    fail_on: Mutex<HashSet<&'static str>>,
    initialized: AtomicBool,
    next_address: AtomicU32,
    /// Name tables pushed to each host, in push order.
    pushed_tables: Mutex<Vec<(String, Vec<(String, String)>)>>,
    /// Machine whose `new_host` call panics.
    panic_on: Mutex<Option<String>>,
    /// Skip filling in the host address on create.
    pub no_address: AtomicBool,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn initialized() -> Arc<Self> {
        let recorder = Self::default();
        recorder.initialized.store(true, Ordering::SeqCst);
        Arc::new(recorder)
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.fail_on.lock().unwrap().insert(operation);
    }

    pub fn clear_failures(&self) {
        self.fail_on.lock().unwrap().clear();
    }

    pub fn panic_on(&self, machine: &str) {
        *self.panic_on.lock().unwrap() = Some(machine.to_string());
    }

    /// Last name table pushed to `machine`, if any.
    pub fn last_table_for(&self, machine: &str) -> Option<Vec<(String, String)>> {
        self.pushed_tables
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, _)| m == machine)
            .map(|(_, table)| table.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, machine: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.machine() == machine)
            .collect()
    }

    pub fn kinds_for(&self, machine: &str) -> Vec<&'static str> {
        self.calls_for(machine).iter().map(Call::kind).collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str) -> Result<(), CollaboratorError> {
        if self.fail_on.lock().unwrap().contains(operation) {
            return Err(Box::new(MockError(operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisioningBackend for Recorder {
    async fn new_host(&self, driver_name: &str, descriptor: &[u8]) -> Result<Host, CollaboratorError> {
        let value: serde_json::Value = serde_json::from_slice(descriptor)?;
        let machine = value["MachineName"].as_str().unwrap_or_default().to_string();
        if self.panic_on.lock().unwrap().as_deref() == Some(machine.as_str()) {
            panic!("backend crashed on {}", machine);
        }
        self.push(Call::NewHost {
            machine: machine.clone(),
            driver: driver_name.to_string(),
        });
        self.check("new_host")?;
        Ok(Host::new(machine, driver_name, descriptor.to_vec()))
    }

    async fn create(&self, host: &mut Host) -> Result<(), CollaboratorError> {
        self.push(Call::Create {
            machine: host.name.clone(),
            flags: host.options.engine.arbitrary_flags.clone(),
        });
        self.check("create")?;
        if !self.no_address.load(Ordering::SeqCst) {
            let n = self.next_address.fetch_add(1, Ordering::SeqCst) + 10;
            host.address = Some(format!("10.0.0.{}", n));
        }
        Ok(())
    }
}

#[async_trait]
impl NameTableWriter for Recorder {
    async fn register(&self, host: &Host, table: &HostsLookupTable) -> Result<(), CollaboratorError> {
        self.push(Call::Register {
            machine: host.name.clone(),
        });
        self.check("register")?;
        self.pushed_tables
            .lock()
            .unwrap()
            .push((host.name.clone(), table.entries()));
        Ok(())
    }
}

#[async_trait]
impl CoordinationStore for Recorder {
    async fn start(&self, host: &Host, masters: &MasterSet) {
        self.push(Call::StartStore {
            machine: host.name.clone(),
            masters: masters.iter().map(str::to_string).collect(),
        });
    }
}

#[async_trait]
impl OverlayNetwork for Recorder {
    async fn join(&self, host: &Host) -> Result<(), CollaboratorError> {
        self.push(Call::OverlayJoin {
            machine: host.name.clone(),
        });
        self.check("overlay_join")
    }

    async fn join_discovery(&self, host: &Host, discovery: &str) -> Result<(), CollaboratorError> {
        self.push(Call::DiscoveryJoin {
            machine: host.name.clone(),
            discovery: discovery.to_string(),
        });
        self.check("discovery_join")
    }
}

/// Built-in control plane backed by a `Recorder`.
pub struct ControlPlane {
    pub recorder: Arc<Recorder>,
    pub init_count: AtomicU32,
}

#[async_trait]
impl BuiltinControlPlane for ControlPlane {
    async fn is_initialized(&self) -> bool {
        self.recorder.initialized.load(Ordering::SeqCst)
    }

    async fn init(&self, host: &Host, _config: &BuiltinConfig) -> Result<(), CollaboratorError> {
        self.recorder.push(Call::Init {
            machine: host.name.clone(),
        });
        self.recorder.check("init")?;
        self.init_count.fetch_add(1, Ordering::SeqCst);
        self.recorder.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn join(
        &self,
        host: &Host,
        _config: &BuiltinConfig,
        is_master: bool,
    ) -> Result<(), CollaboratorError> {
        self.recorder.push(Call::Join {
            machine: host.name.clone(),
            is_master,
        });
        self.recorder.check("join")
    }
}

pub fn collaborators(recorder: &Arc<Recorder>) -> Collaborators {
    Collaborators {
        backend: recorder.clone(),
        name_table: recorder.clone(),
        coordination_store: recorder.clone(),
        overlay: recorder.clone(),
        control_plane: Arc::new(ControlPlane {
            recorder: recorder.clone(),
            init_count: AtomicU32::new(0),
        }),
    }
}

pub fn settings(masters: &[&str]) -> ClusterSettings {
    let mut settings = ClusterSettings::new("alice", "s3cret", "/home/alice/.ssh/id_rsa");
    settings.master_nodes = masters.iter().map(|m| m.to_string()).collect();
    settings.store_path = Some("/var/lib/machine".into());
    settings
}

pub fn standalone(masters: &[&str], storage: bool, overlay: bool) -> Arc<ClusterConfig> {
    let mut s = settings(masters);
    s.standalone = Some(StandaloneConfig::new(DISCOVERY));
    s.coordination_storage = storage;
    s.overlay_networking = overlay;
    Arc::new(ClusterConfig::try_from(s).expect("valid standalone config"))
}

pub fn builtin(masters: &[&str]) -> Arc<ClusterConfig> {
    let mut s = settings(masters);
    s.builtin = Some(BuiltinConfig::default());
    Arc::new(ClusterConfig::try_from(s).expect("valid builtin config"))
}

pub fn node(cluster: &Arc<ClusterConfig>, machine: &str) -> Node {
    Node::new(
        Arc::clone(cluster),
        NodeSpec {
            machine_name: machine.to_string(),
            node_name: format!("{}.rennes.grid5000.fr", machine),
            site: "rennes".to_string(),
            job_id: 1_234_567,
            engine_opts: vec!["log-level=debug".to_string()],
            engine_labels: vec![format!("node={}", machine)],
        },
    )
}
