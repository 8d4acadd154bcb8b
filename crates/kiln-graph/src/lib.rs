//! # kiln-graph
//!
//! Dependency graph construction and build-order resolution for images.
//!
//! Handles:
//! - **Graph**: Arena of image nodes keyed by name, with "depends on" edges.
//! - **Resolver**: Post-order traversal yielding dependencies before
//!   dependents, for the whole graph or a seed subset and its closure.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod graph;
pub mod resolver;

pub use graph::{DependencyGraph, DependencyRecord};
pub use petgraph::graph::NodeIndex;
pub use resolver::{ResolvedOrder, Resolver};
