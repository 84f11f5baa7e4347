//! clusterctl: validate a Grid'5000 cluster file and print each node's bootstrap plan.

use clap::{Parser, Subcommand};
use cluster::{ClusterFile, Node};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "clusterctl", version, about = "Grid'5000 cluster bootstrap planner")]
struct Args {
    #[arg(short = 'c', long = "config", help = "Cluster file (default: ~/.g5k/cluster.toml)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the cluster file and exit
    Validate,
    /// Print the bootstrap steps of every node, or of one node
    Plan {
        #[arg(long = "node")]
        node: Option<String>,
    },
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".g5k")
            .join("cluster.toml")
    });

    let (config, nodes) = match ClusterFile::load(&config_path).and_then(ClusterFile::into_nodes) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Invalid cluster file {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::Validate => {
            info!(
                "Cluster file OK: {} nodes, {} masters, clustering '{}'",
                nodes.len(),
                config.masters().len(),
                config.clustering().name()
            );
            ExitCode::SUCCESS
        }
        Command::Plan { node } => {
            let selected: Vec<&Node> = nodes
                .iter()
                .filter(|n| node.as_deref().map_or(true, |name| n.machine_name() == name))
                .collect();
            if selected.is_empty() {
                eprintln!("No node named {:?} in {}", node.unwrap_or_default(), config_path.display());
                return ExitCode::FAILURE;
            }
            for n in selected {
                println!("{} ({}, {}):", n.machine_name(), n.node_name(), n.role());
                for (i, step) in n.plan().iter().enumerate() {
                    println!("  {:>2}. {}", i + 1, step);
                }
            }
            ExitCode::SUCCESS
        }
    }
}
