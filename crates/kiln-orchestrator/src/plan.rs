//! Local/remote partitioning of a resolved build order.

use std::collections::HashSet;

use kiln_common::types::ImageName;
use serde::Serialize;

/// What a build run will do, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Discovered images to build, dependencies first.
    pub local: Vec<ImageName>,
    /// External images to pull, in resolution order.
    pub remote: Vec<ImageName>,
}

impl BuildPlan {
    /// Whether the plan neither pulls nor builds anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }
}

/// Splits a resolved order (as yielded by
/// [`kiln_graph::ResolvedOrder::iter`]) into images to build (`is_local`)
/// and images to pull.
///
/// A single pass: each side keeps resolution order and lists a name once.
pub fn partition<'a>(
    order: impl IntoIterator<Item = &'a str>,
    is_local: impl Fn(&str) -> bool,
) -> BuildPlan {
    let mut plan = BuildPlan::default();
    let mut seen = HashSet::new();
    for name in order {
        if !seen.insert(name) {
            continue;
        }
        let side = if is_local(name) {
            &mut plan.local
        } else {
            &mut plan.remote
        };
        side.push(ImageName::new(name));
    }
    plan
}

#[cfg(test)]
mod tests {
    use kiln_graph::{DependencyGraph, Resolver};

    use super::*;

    fn graph(records: &[(&str, &[&str])]) -> DependencyGraph {
        let records: Vec<(String, Vec<String>)> = records
            .iter()
            .map(|(name, deps)| {
                (
                    (*name).to_string(),
                    deps.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        DependencyGraph::from_records(&records)
    }

    fn names(list: &[ImageName]) -> Vec<&str> {
        list.iter().map(ImageName::as_str).collect()
    }

    #[test]
    fn splits_by_locality_preserving_order() {
        let graph = graph(&[
            ("app", &["lib", "node:22"]),
            ("lib", &["debian:bookworm"]),
        ]);
        let order = Resolver::new(&graph).resolve().expect("resolve");
        let plan = partition(order.iter(), |n| n == "app" || n == "lib");
        assert_eq!(names(&plan.local), vec!["lib", "app"]);
        assert_eq!(names(&plan.remote), vec!["debian:bookworm", "node:22"]);
    }

    #[test]
    fn every_node_lands_in_exactly_one_side() {
        let graph = graph(&[("a", &["x", "b"]), ("b", &["y", "x"]), ("c", &["y"])]);
        let order = Resolver::new(&graph).resolve().expect("resolve");
        let plan = partition(order.iter(), |n| ["a", "b", "c"].contains(&n));

        let mut all: Vec<&str> = names(&plan.local);
        all.extend(names(&plan.remote));
        all.sort_unstable();
        assert_eq!(all, vec!["a", "b", "c", "x", "y"]);
    }

    #[test]
    fn empty_order_gives_empty_plan() {
        let graph = DependencyGraph::new();
        let order = Resolver::new(&graph).resolve().expect("resolve");
        assert!(partition(order.iter(), |_| true).is_empty());
    }

    #[test]
    fn repeated_names_are_listed_once() {
        let plan = partition(["base", "app", "base", "node:22", "app", "node:22"], |n| {
            n == "app" || n == "base"
        });
        assert_eq!(names(&plan.local), vec!["base", "app"]);
        assert_eq!(names(&plan.remote), vec!["node:22"]);
    }

    #[test]
    fn plan_serializes_as_name_lists() {
        let plan = BuildPlan {
            local: vec![ImageName::new("app")],
            remote: vec![ImageName::new("base")],
        };
        let json = serde_json::to_string(&plan).expect("serialize");
        assert_eq!(json, r#"{"local":["app"],"remote":["base"]}"#);
    }
}
