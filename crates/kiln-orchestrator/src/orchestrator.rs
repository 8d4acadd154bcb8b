//! Build run orchestration.
//!
//! Discovery yields image records; the orchestrator indexes them into a
//! [`DependencyGraph`], resolves a [`BuildPlan`], and drives the runtime
//! through it: pull every remote image, build every local image, then push
//! if asked. Execution is sequential and stops at the first failure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kiln_common::config::BuildConfig;
use kiln_common::error::{KilnError, Result};
use kiln_common::types::ImageName;
use kiln_graph::{DependencyGraph, Resolver};
use kiln_image::{ContainerRuntime, Discovery, Image};

use crate::plan::{BuildPlan, partition};

/// Counts of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// External images pulled.
    pub pulled: usize,
    /// Local images built.
    pub built: usize,
    /// Image/registry pushes performed.
    pub pushed: usize,
    /// Wall-clock time spent in the runtime.
    pub elapsed: Duration,
}

/// Indexed images and their dependency graph for one run.
#[derive(Debug)]
pub struct Orchestrator {
    images: Vec<Image>,
    by_name: HashMap<String, usize>,
    graph: DependencyGraph,
}

impl Orchestrator {
    /// Indexes every image `discovery` yields and builds the graph.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::DiscoveryEmpty` if nothing is found, or the
    /// discovery's own error.
    pub fn index<D: Discovery + ?Sized>(discovery: &D) -> Result<Self> {
        let images = discovery.discover()?;
        if images.is_empty() {
            tracing::info!("no images found");
            return Err(KilnError::DiscoveryEmpty {
                directories: discovery.locations(),
            });
        }
        Ok(Self::from_images(images))
    }

    /// Builds the graph for an already discovered, non-empty image set.
    ///
    /// A name discovered twice keeps its first position and its later
    /// definition.
    fn from_images(discovered: Vec<Image>) -> Self {
        let mut images: Vec<Image> = Vec::with_capacity(discovered.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for image in discovered {
            if let Some(&i) = by_name.get(image.name.as_str()) {
                tracing::warn!(
                    image = %image.name,
                    previous = %images[i].dockerfile.display(),
                    replacement = %image.dockerfile.display(),
                    "image defined more than once, using the later definition"
                );
                images[i] = image;
            } else {
                let _ = by_name.insert(image.name.as_str().to_string(), images.len());
                images.push(image);
            }
        }

        tracing::info!(images = images.len(), "building dependency graph");
        let graph = DependencyGraph::from_records(&images);
        tracing::debug!(
            nodes = ?graph.nodes().map(|(_, name)| name).collect::<Vec<_>>(),
            "dependency graph"
        );
        Self {
            images,
            by_name,
            graph,
        }
    }

    /// The dependency graph of this run.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Discovered images, in discovery order.
    #[must_use]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Looks up a discovered image.
    #[must_use]
    pub fn image(&self, name: &str) -> Option<&Image> {
        self.by_name.get(name).map(|&i| &self.images[i])
    }

    /// Whether `name` was discovered locally (and so must be built).
    #[must_use]
    pub fn is_local(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Plans a build of every node in the graph.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::CycleDetected` if the graph has a cycle.
    pub fn resolve_all(&self) -> Result<BuildPlan> {
        tracing::debug!("resolving dependency order (all)");
        let order = Resolver::new(&self.graph).resolve()?;
        let plan = partition(order.iter(), |name| self.is_local(name));
        log_plan(&plan);
        Ok(plan)
    }

    /// Plans a build of `seeds` and their dependencies, plus everything
    /// depending on them when `downstream` is set.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::NodeNotFound` for an unknown seed before any
    /// traversal, or `KilnError::CycleDetected`.
    pub fn resolve<S: AsRef<str>>(&self, seeds: &[S], downstream: bool) -> Result<BuildPlan> {
        let seeds = self.graph.lookup_all(seeds)?;
        tracing::debug!(
            seeds = ?seeds.iter().map(|&s| self.graph.name(s)).collect::<Vec<_>>(),
            downstream,
            "resolving dependency order"
        );
        let order = Resolver::new(&self.graph).resolve_nodes(&seeds, downstream)?;
        let plan = partition(order.iter(), |name| self.is_local(name));
        log_plan(&plan);
        Ok(plan)
    }

    /// Plans the requested images, or everything when none are requested.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`] and [`Self::resolve_all`].
    pub fn plan<S: AsRef<str>>(&self, images: &[S], downstream: bool) -> Result<BuildPlan> {
        if images.is_empty() {
            self.resolve_all()
        } else {
            self.resolve(images, downstream)
        }
    }

    /// Runs `plan` against `runtime`: pull all remote images, build all
    /// local images, then push each local image to each registry if
    /// `push` is set.
    ///
    /// # Errors
    ///
    /// Returns the first runtime failure; later operations are not
    /// attempted. Returns `KilnError::NodeNotFound` if the plan names a
    /// local image this run did not discover.
    pub fn execute<R: ContainerRuntime + ?Sized>(
        &self,
        plan: &BuildPlan,
        runtime: &mut R,
        registries: &[String],
        push: bool,
    ) -> Result<ExecutionSummary> {
        let started = Instant::now();
        let mut summary = ExecutionSummary::default();

        let local = plan
            .local
            .iter()
            .map(|name| {
                self.image(name.as_str()).ok_or_else(|| KilnError::NodeNotFound {
                    name: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for name in &plan.remote {
            runtime.pull(name)?;
            summary.pulled += 1;
        }

        for image in &local {
            runtime.build(image)?;
            summary.built += 1;
        }

        if push {
            for image in &local {
                for registry in registries {
                    runtime.push(&image.name, registry)?;
                    summary.pushed += 1;
                }
            }
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            pulled = summary.pulled,
            built = summary.built,
            pushed = summary.pushed,
            elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            "build run complete"
        );
        Ok(summary)
    }

    /// Full run as configured: index, plan `config.images` (or everything),
    /// execute, push when `core.push` is set.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage.
    pub fn run<D, R>(config: &BuildConfig, discovery: &D, runtime: &mut R) -> Result<ExecutionSummary>
    where
        D: Discovery + ?Sized,
        R: ContainerRuntime + ?Sized,
    {
        let orchestrator = Self::index(discovery)?;
        let plan = orchestrator.plan(&config.images, config.core.downstream)?;
        orchestrator.execute(&plan, runtime, &config.registries, config.core.push)
    }
}

fn log_plan(plan: &BuildPlan) {
    tracing::debug!(
        local = ?plan.local.iter().map(ImageName::as_str).collect::<Vec<_>>(),
        "dependency order (local)"
    );
    tracing::debug!(
        remote = ?plan.remote.iter().map(ImageName::as_str).collect::<Vec<_>>(),
        "dependency order (remote)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, deps: &[&str]) -> Image {
        Image::new(
            name,
            format!("{name}/Dockerfile"),
            deps.iter().map(|d| ImageName::new(*d)).collect(),
        )
    }

    #[test]
    fn image_lookup_and_locality() {
        let orchestrator = Orchestrator::from_images(vec![image("app", &["base"])]);
        assert!(orchestrator.is_local("app"));
        assert!(!orchestrator.is_local("base"));
        assert!(orchestrator.graph().contains("base"));
        assert_eq!(
            orchestrator.image("app").map(|i| i.name.as_str()),
            Some("app")
        );
        assert!(orchestrator.image("base").is_none());
    }

    #[test]
    fn duplicate_names_keep_the_later_definition() {
        let orchestrator = Orchestrator::from_images(vec![
            image("base", &["alpine"]),
            image("app", &["base"]),
            Image::new("base", "vendor/base/Dockerfile", vec![ImageName::new("debian")]),
        ]);

        let names: Vec<&str> = orchestrator.images().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["base", "app"]);
        assert_eq!(
            orchestrator.image("base").map(|i| i.dockerfile.clone()),
            Some(std::path::PathBuf::from("vendor/base/Dockerfile"))
        );
        assert!(!orchestrator.graph().contains("alpine"));

        let plan = orchestrator.resolve_all().expect("resolve");
        assert_eq!(plan.remote, vec![ImageName::new("debian")]);
    }

    #[test]
    fn plan_without_images_resolves_everything() {
        let orchestrator =
            Orchestrator::from_images(vec![image("app", &["base"]), image("tool", &[])]);
        let empty: &[&str] = &[];
        let plan = orchestrator.plan(empty, false).expect("plan");
        assert_eq!(plan.local.len(), 2);
        assert_eq!(plan.remote, vec![ImageName::new("base")]);
    }

    #[test]
    fn execute_rejects_foreign_local_image() {
        let orchestrator = Orchestrator::from_images(vec![image("app", &[])]);
        let plan = BuildPlan {
            local: vec![ImageName::new("stranger")],
            remote: Vec::new(),
        };
        let mut runtime = kiln_image::DryRun::new();
        let err = orchestrator
            .execute(&plan, &mut runtime, &[], false)
            .unwrap_err();
        assert!(matches!(err, KilnError::NodeNotFound { .. }));
        assert!(runtime.operations().is_empty());
    }
}
