//! Unit tests for cluster configuration
//!
//! Loading, defaults, clustering-mode exclusivity and node binding.

mod common;

use cluster::{
    BuiltinConfig, ClusterConfig, ClusterFile, ClusteringMode, ConfigError, StandaloneConfig,
};
use std::io::Write;
use tempfile::NamedTempFile;

const STANDALONE_FILE: &str = r#"
[cluster]
master_nodes = ["n1"]
coordination_storage = true
overlay_networking = true
store_path = "/srv/machine"

[cluster.g5k]
username = "alice"
password = "s3cret"
ssh_key_pair = "/home/alice/.ssh/id_rsa"

[cluster.standalone]
discovery = "zk://n1:2181/swarm"

[[nodes]]
machine_name = "n1"
node_name = "paravance-1.rennes.grid5000.fr"
site = "rennes"
job_id = 42

[[nodes]]
machine_name = "n2"
node_name = "paravance-2.rennes.grid5000.fr"
site = "rennes"
job_id = 42
engine_labels = ["disk=ssd"]
"#;

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_standalone_cluster_file() {
    let file = write_file(STANDALONE_FILE);
    let cluster_file = ClusterFile::load(file.path()).unwrap();
    let (config, nodes) = cluster_file.into_nodes().unwrap();

    assert_eq!(config.g5k().image, "jessie-x64-min");
    assert_eq!(config.g5k().walltime, "1:00:00");
    assert_eq!(config.engine_install_url(), "https://get.docker.com");
    assert_eq!(config.store().root().to_str(), Some("/srv/machine"));
    assert!(config.coordination_storage());
    assert!(config.overlay_networking());

    let standalone = config.clustering().standalone().unwrap();
    assert_eq!(standalone.discovery, "zk://n1:2181/swarm");
    assert_eq!(standalone.strategy, "spread");
    assert_eq!(standalone.advertise, "eth0:2379");

    assert_eq!(nodes.len(), 2);
    assert!(nodes[0].is_master());
    assert!(!nodes[1].is_master());
    assert_eq!(nodes[1].spec().engine_labels, vec!["disk=ssd".to_string()]);
}

#[test]
fn test_load_missing_file() {
    let result = ClusterFile::load(std::path::Path::new("/nonexistent/cluster.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_load_malformed_file() {
    let file = write_file("[cluster\nmaster_nodes = ");
    let result = ClusterFile::load(file.path());
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_both_clustering_modes_rejected() {
    let mut settings = common::settings(&["n1"]);
    settings.standalone = Some(StandaloneConfig::new(common::DISCOVERY));
    settings.builtin = Some(BuiltinConfig::default());

    let result = ClusterConfig::try_from(settings);
    assert!(matches!(result, Err(ConfigError::ConflictingClusteringModes)));
}

#[test]
fn test_both_modes_in_file_rejected() {
    let content = STANDALONE_FILE.replacen(
        "[[nodes]]",
        "[cluster.builtin]\nlisten_addr = \"0.0.0.0:2377\"\n\n[[nodes]]",
        1,
    );
    let file = write_file(&content);
    let cluster_file = ClusterFile::load(file.path()).unwrap();
    assert!(cluster_file.cluster.builtin.is_some());
    assert!(cluster_file.cluster.standalone.is_some());
    assert!(matches!(
        cluster_file.into_nodes(),
        Err(ConfigError::ConflictingClusteringModes)
    ));
}

#[test]
fn test_storage_requires_standalone() {
    let mut settings = common::settings(&["n1"]);
    settings.coordination_storage = true;
    assert!(matches!(
        ClusterConfig::try_from(settings.clone()),
        Err(ConfigError::StorageWithoutStandalone)
    ));

    settings.builtin = Some(BuiltinConfig::default());
    assert!(matches!(
        ClusterConfig::try_from(settings),
        Err(ConfigError::StorageWithoutStandalone)
    ));
}

#[test]
fn test_overlay_with_builtin_is_accepted() {
    let mut settings = common::settings(&["n1"]);
    settings.builtin = Some(BuiltinConfig::default());
    settings.overlay_networking = true;

    let config = ClusterConfig::try_from(settings).unwrap();
    assert_eq!(config.clustering(), &ClusteringMode::Builtin(BuiltinConfig::default()));
}

#[test]
fn test_no_mode_is_none() {
    let config = ClusterConfig::try_from(common::settings(&[])).unwrap();
    assert_eq!(config.clustering(), &ClusteringMode::None);
    assert_eq!(config.clustering().name(), "none");
    assert!(config.masters().is_empty());
}

#[test]
fn test_missing_username_rejected() {
    let mut settings = common::settings(&["n1"]);
    settings.g5k.username.clear();
    assert!(matches!(
        ClusterConfig::try_from(settings),
        Err(ConfigError::Missing("g5k.username"))
    ));
}

#[test]
fn test_duplicate_machine_rejected() {
    let content = STANDALONE_FILE.replace("machine_name = \"n2\"", "machine_name = \"n1\"");
    let file = write_file(&content);
    let result = ClusterFile::load(file.path()).unwrap().into_nodes();
    assert!(matches!(result, Err(ConfigError::DuplicateMachine(name)) if name == "n1"));
}

#[test]
fn test_password_not_in_debug_output() {
    let settings = common::settings(&["n1"]);
    let config = ClusterConfig::try_from(settings).unwrap();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("s3cret"));

    let node = common::node(&std::sync::Arc::new(config), "n1");
    assert!(!format!("{:?}", node.descriptor()).contains("s3cret"));
}
