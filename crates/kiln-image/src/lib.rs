//! # kiln-image
//!
//! Image definitions and the container runtime they are built with.
//!
//! Handles:
//! - **Dockerfile**: Extraction of base image references from `FROM` and
//!   `COPY --from` instructions.
//! - **Discovery**: Recursive search of configured directories for Dockerfiles.
//! - **Runtime**: Pull, build, tag, and push through the `docker` or `podman` CLI.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod discovery;
pub mod dockerfile;
pub mod image;
pub mod runtime;

pub use discovery::{Discovery, FsDiscovery};
pub use image::Image;
pub use runtime::{ContainerRuntime, DockerCli, DryRun};
