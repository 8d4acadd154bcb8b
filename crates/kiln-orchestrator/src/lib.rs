//! # kiln-orchestrator
//!
//! Turns discovered images into a build run.
//!
//! Provides two entry points:
//! - [`Orchestrator`](orchestrator::Orchestrator): Indexes images into a
//!   dependency graph, resolves build plans, and drives the runtime.
//! - [`partition`](plan::partition): Splits a resolved order into images to
//!   build and images to pull.
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_common::config::BuildConfig;
//! use kiln_image::{DryRun, FsDiscovery};
//! use kiln_orchestrator::orchestrator::Orchestrator;
//!
//! let config = BuildConfig::default();
//! let mut runtime = DryRun::new();
//! let summary = Orchestrator::run(&config, &FsDiscovery::from_config(&config), &mut runtime)?;
//! println!("built {} image(s)", summary.built);
//! # Ok::<(), kiln_common::error::KilnError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod orchestrator;
pub mod plan;

pub use orchestrator::{ExecutionSummary, Orchestrator};
pub use plan::{BuildPlan, partition};
