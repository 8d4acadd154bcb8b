//! `kiln graph` — Show the discovered images and their dependencies.

use clap::Args;
use kiln_common::config::BuildConfig;
use kiln_image::FsDiscovery;
use kiln_orchestrator::Orchestrator;
use serde::Serialize;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Print the graph as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One graph node as printed by `kiln graph --json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GraphNode<'a> {
    /// Image name.
    pub name: &'a str,
    /// Whether the image is built locally.
    pub local: bool,
    /// Direct dependencies in declaration order.
    pub dependencies: Vec<&'a str>,
    /// Direct dependents in declaration order.
    pub dependents: Vec<&'a str>,
}

/// Lists every node of the run's graph in insertion order.
pub fn nodes(orchestrator: &Orchestrator) -> Vec<GraphNode<'_>> {
    let graph = orchestrator.graph();
    graph
        .nodes()
        .map(|(idx, name)| GraphNode {
            name,
            local: orchestrator.is_local(name),
            dependencies: graph.dependencies(idx).into_iter().map(|d| graph.name(d)).collect(),
            dependents: graph.dependents(idx).into_iter().map(|d| graph.name(d)).collect(),
        })
        .collect()
}

/// Executes the `graph` command.
///
/// # Errors
///
/// Returns an error if discovery fails.
pub fn execute(args: &GraphArgs, config: &BuildConfig) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::index(&FsDiscovery::from_config(config))?;
    let nodes = nodes(&orchestrator);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        print!("{}", crate::output::render_graph(&nodes));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn nodes_mark_locality_and_edges() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        for (rel, content) in [
            ("app/Dockerfile", "FROM base\n"),
            ("base/Dockerfile", "FROM debian:bookworm\n"),
        ] {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            std::fs::write(path, content).expect("write");
        }
        let discovery = FsDiscovery::new(vec![PathBuf::from(dir.path())], None);
        let orchestrator = Orchestrator::index(&discovery).expect("index");

        let nodes = nodes(&orchestrator);
        assert_eq!(
            nodes,
            vec![
                GraphNode {
                    name: "app",
                    local: true,
                    dependencies: vec!["base"],
                    dependents: vec![],
                },
                GraphNode {
                    name: "base",
                    local: true,
                    dependencies: vec!["debian:bookworm"],
                    dependents: vec!["app"],
                },
                GraphNode {
                    name: "debian:bookworm",
                    local: false,
                    dependencies: vec![],
                    dependents: vec!["base"],
                },
            ]
        );
    }
}
