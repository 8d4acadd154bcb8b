//! Dependency graph management using `petgraph`.
//!
//! Nodes are image names; an edge points from an image to an image it
//! depends on. The graph is an arena: nodes live in the `petgraph` node
//! list and are referenced by [`NodeIndex`], so fan-in never creates
//! ownership cycles.

use std::collections::HashMap;

use kiln_common::error::{KilnError, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// An image definition as yielded by discovery: a name plus the names it
/// depends on, in declaration order.
pub trait DependencyRecord {
    /// Unique name of the image.
    fn name(&self) -> &str;

    /// Names of the images this one depends on.
    fn dependencies(&self) -> impl Iterator<Item = &str>;
}

impl<S: AsRef<str>> DependencyRecord for (S, Vec<S>) {
    fn name(&self) -> &str {
        self.0.as_ref()
    }

    fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.1.iter().map(|d| d.as_ref())
    }
}

/// A dependency graph of images.
///
/// Iteration follows insertion order and dependency lists follow
/// declaration order, which is what makes resolution deterministic.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for a set of discovered records.
    ///
    /// Every record gets a node, in record order. A dependency name that
    /// no record declares is materialized as an edge-less node the first
    /// time it is seen. Edges are added only once every node exists, so no
    /// edge can dangle.
    pub fn from_records<R: DependencyRecord>(records: &[R]) -> Self {
        let mut graph = Self::new();
        for record in records {
            let _ = graph.add_node(record.name());
            for dependency in record.dependencies() {
                let _ = graph.add_node(dependency);
            }
        }
        for record in records {
            let dependent = graph.index[record.name()];
            for dependency in record.dependencies() {
                let dependency = graph.index[dependency];
                graph.add_dependency(dependent, dependency);
            }
        }
        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        graph
    }

    /// Adds a node for `name`, or returns the existing node of that name.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeIndex {
        let name = name.into();
        if let Some(&idx) = self.index.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(name.clone());
        let _ = self.index.insert(name, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Duplicate edges are kept.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependent, dependency, ());
    }

    /// Looks up a node by name.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::NodeNotFound` if no node has that name.
    pub fn lookup(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| KilnError::NodeNotFound { name: name.into() })
    }

    /// Looks up several nodes by name, preserving the requested order.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::NodeNotFound` for the first missing name.
    pub fn lookup_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<NodeIndex>> {
        names.iter().map(|n| self.lookup(n.as_ref())).collect()
    }

    /// Returns whether a node with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the name of a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &str)> {
        self.graph
            .node_indices()
            .map(|idx| (idx, self.graph[idx].as_str()))
    }

    /// Returns the nodes `idx` depends on, in declaration order.
    #[must_use]
    pub fn dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(idx, Direction::Outgoing)
    }

    /// Returns the nodes that depend directly on `idx`, in declaration order.
    #[must_use]
    pub fn dependents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.neighbors_in_order(idx, Direction::Incoming)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of dependency edges, duplicates included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // petgraph lists neighbors most recently added first.
    fn neighbors_in_order(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.reverse();
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, deps: &[&str]) -> (String, Vec<String>) {
        (
            name.to_string(),
            deps.iter().map(ToString::to_string).collect(),
        )
    }

    fn names(graph: &DependencyGraph, indices: &[NodeIndex]) -> Vec<String> {
        indices.iter().map(|&i| graph.name(i).to_string()).collect()
    }

    #[test]
    fn empty_graph_has_no_nodes() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.nodes().count(), 0);
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node("api");
        let b = graph.add_node("api");
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn lookup_missing_returns_not_found() {
        let graph = DependencyGraph::new();
        let err = graph.lookup("ghost").unwrap_err();
        assert!(matches!(err, KilnError::NodeNotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn lookup_all_fails_on_first_missing() {
        let graph = DependencyGraph::from_records(&[record("app", &[])]);
        let err = graph.lookup_all(&["app", "ghost", "phantom"]).unwrap_err();
        assert!(matches!(err, KilnError::NodeNotFound { ref name } if name == "ghost"));
    }

    #[test]
    fn from_records_materializes_undeclared_dependencies() {
        let graph = DependencyGraph::from_records(&[
            record("app", &["base"]),
            record("worker", &["base"]),
        ]);
        let order: Vec<&str> = graph.nodes().map(|(_, n)| n).collect();
        assert_eq!(order, vec!["app", "base", "worker"]);
        let base = graph.lookup("base").expect("base");
        assert!(graph.dependencies(base).is_empty());
    }

    #[test]
    fn from_records_keeps_first_position_of_forward_reference() {
        let graph = DependencyGraph::from_records(&[
            record("app", &["lib"]),
            record("lib", &["debian:bookworm"]),
        ]);
        let order: Vec<&str> = graph.nodes().map(|(_, n)| n).collect();
        assert_eq!(order, vec!["app", "lib", "debian:bookworm"]);
        let lib = graph.lookup("lib").expect("lib");
        assert_eq!(names(&graph, &graph.dependencies(lib)), vec!["debian:bookworm"]);
    }

    #[test]
    fn dependencies_follow_declaration_order() {
        let graph = DependencyGraph::from_records(&[record("app", &["zeta", "alpha", "mid"])]);
        let app = graph.lookup("app").expect("app");
        assert_eq!(
            names(&graph, &graph.dependencies(app)),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn dependents_follow_declaration_order() {
        let graph = DependencyGraph::from_records(&[
            record("worker", &["base"]),
            record("app", &["base"]),
        ]);
        let base = graph.lookup("base").expect("base");
        assert_eq!(names(&graph, &graph.dependents(base)), vec!["worker", "app"]);
    }

    #[test]
    fn duplicate_edges_are_kept() {
        let graph = DependencyGraph::from_records(&[record("app", &["base", "base"])]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn every_edge_target_is_a_node() {
        let graph = DependencyGraph::from_records(&[
            record("a", &["b", "x"]),
            record("b", &["y"]),
            record("c", &["a", "y"]),
        ]);
        for (idx, _) in graph.nodes() {
            for dep in graph.dependencies(idx) {
                assert!(graph.contains(graph.name(dep)));
            }
        }
        assert_eq!(graph.len(), 5);
    }
}
