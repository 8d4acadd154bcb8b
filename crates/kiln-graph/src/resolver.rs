//! Build-order resolution.
//!
//! A depth-first, post-order walk over dependency edges: a node is emitted
//! only after everything it depends on. The walk keeps an explicit stack
//! and a three-state mark per node, so deep graphs cannot overflow the call
//! stack and a cycle is simply an edge into a node still marked in progress.

use kiln_common::error::{KilnError, Result};
use petgraph::graph::NodeIndex;

use crate::graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A build order: every node appears after the nodes it depends on.
#[derive(Debug, Clone)]
pub struct ResolvedOrder<'g> {
    graph: &'g DependencyGraph,
    nodes: Vec<NodeIndex>,
}

impl<'g> ResolvedOrder<'g> {
    /// Node indices in build order.
    #[must_use]
    pub fn indices(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Node names in build order.
    pub fn iter(&self) -> impl Iterator<Item = &'g str> + '_ {
        self.nodes.iter().map(|&idx| self.graph.name(idx))
    }

    /// Owned node names in build order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }

    /// Number of nodes in the order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the order is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolves build orders over a [`DependencyGraph`].
#[derive(Debug)]
pub struct Resolver<'g> {
    graph: &'g DependencyGraph,
    /// Forward adjacency in declaration order, indexed by node.
    dependencies: Vec<Vec<NodeIndex>>,
}

impl<'g> Resolver<'g> {
    /// Creates a resolver for `graph`.
    #[must_use]
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let dependencies = graph
            .nodes()
            .map(|(idx, _)| graph.dependencies(idx))
            .collect();
        Self {
            graph,
            dependencies,
        }
    }

    /// Resolves the build order of every node in the graph.
    ///
    /// Independent nodes keep their insertion order.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::CycleDetected` if the graph contains a cycle.
    pub fn resolve(&self) -> Result<ResolvedOrder<'g>> {
        let starts: Vec<NodeIndex> = self.graph.nodes().map(|(idx, _)| idx).collect();
        let order = self.walk(&starts)?;
        tracing::debug!(order = ?order.names(), "resolved dependency order (all)");
        Ok(order)
    }

    /// Resolves the build order of `seeds` and their transitive closure.
    ///
    /// Without `downstream` the result is the seeds plus everything they
    /// transitively depend on. With `downstream` every node that
    /// transitively depends on a seed is added as a seed too, so the
    /// dependencies of those dependents are emitted as well.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::CycleDetected` if a cycle is reachable from the
    /// requested nodes.
    pub fn resolve_nodes(&self, seeds: &[NodeIndex], downstream: bool) -> Result<ResolvedOrder<'g>> {
        let order = if downstream {
            let upward = closure(seeds, &invert(&self.dependencies));
            self.walk(&upward)?
        } else {
            self.walk(seeds)?
        };
        tracing::debug!(
            seeds = ?seeds.iter().map(|&s| self.graph.name(s)).collect::<Vec<_>>(),
            downstream,
            order = ?order.names(),
            "resolved dependency order"
        );
        Ok(order)
    }

    /// Post-order walk from each start node in turn.
    fn walk(&self, starts: &[NodeIndex]) -> Result<ResolvedOrder<'g>> {
        let mut marks = vec![Mark::Unvisited; self.dependencies.len()];
        let mut nodes = Vec::new();
        // (node, position of the next dependency to visit)
        let mut stack: Vec<(NodeIndex, usize)> = Vec::new();

        for &start in starts {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }
            marks[start.index()] = Mark::InProgress;
            stack.push((start, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                if let Some(&next) = self.dependencies[node.index()].get(frame.1) {
                    frame.1 += 1;
                    match marks[next.index()] {
                        Mark::Unvisited => {
                            marks[next.index()] = Mark::InProgress;
                            stack.push((next, 0));
                        }
                        Mark::InProgress => return Err(self.cycle_error(&stack, next)),
                        Mark::Done => {}
                    }
                } else {
                    marks[node.index()] = Mark::Done;
                    let _ = stack.pop();
                    tracing::trace!(node = self.graph.name(node), "emit");
                    nodes.push(node);
                }
            }
        }

        Ok(ResolvedOrder {
            graph: self.graph,
            nodes,
        })
    }

    fn cycle_error(&self, stack: &[(NodeIndex, usize)], node: NodeIndex) -> KilnError {
        let start = stack.iter().position(|&(idx, _)| idx == node).unwrap_or(0);
        let path = stack[start..]
            .iter()
            .map(|&(idx, _)| idx)
            .chain(std::iter::once(node))
            .map(|idx| self.graph.name(idx).to_string())
            .collect();
        KilnError::CycleDetected {
            node: self.graph.name(node).to_string(),
            path,
        }
    }
}

/// Reverse adjacency: for each node, the nodes that list it as a dependency.
fn invert(adjacency: &[Vec<NodeIndex>]) -> Vec<Vec<NodeIndex>> {
    let mut inverse = vec![Vec::new(); adjacency.len()];
    for (from, targets) in adjacency.iter().enumerate() {
        for target in targets {
            inverse[target.index()].push(NodeIndex::new(from));
        }
    }
    inverse
}

/// Breadth-first closure over `adjacency`, starts first, each node once.
fn closure(starts: &[NodeIndex], adjacency: &[Vec<NodeIndex>]) -> Vec<NodeIndex> {
    let mut seen = vec![false; adjacency.len()];
    let mut queue = std::collections::VecDeque::new();
    let mut visited = Vec::new();
    for &start in starts {
        if !std::mem::replace(&mut seen[start.index()], true) {
            queue.push_back(start);
        }
    }
    while let Some(node) = queue.pop_front() {
        visited.push(node);
        for &next in &adjacency[node.index()] {
            if !std::mem::replace(&mut seen[next.index()], true) {
                queue.push_back(next);
            }
        }
    }
    visited
}
