//! Container runtime invocation.
//!
//! Each operation is a blocking child process of the `docker` (or
//! `podman`) CLI. A non-zero exit is an error; nothing is retried.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use kiln_common::error::{KilnError, Result};
use kiln_common::types::ImageName;

use crate::image::Image;

/// The operations a build run needs from a container runtime.
pub trait ContainerRuntime {
    /// Fetches an external image.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::ExternalOperationFailed` if the pull fails.
    fn pull(&mut self, name: &ImageName) -> Result<()>;

    /// Builds a local image from its Dockerfile and context.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::ExternalOperationFailed` if the build fails.
    fn build(&mut self, image: &Image) -> Result<()>;

    /// Pushes a built image to `registry`.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::ExternalOperationFailed` if tagging or pushing fails.
    fn push(&mut self, name: &ImageName, registry: &str) -> Result<()>;
}

/// Runtime backed by the `docker`-compatible command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
    verbose: bool,
}

impl DockerCli {
    /// Creates a runtime that invokes `binary` directly.
    ///
    /// With `verbose`, the child's standard output is shown; otherwise it
    /// is discarded. Standard error is always shown.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            binary: binary.into(),
            verbose,
        }
    }

    /// Locates `runtime` (e.g. `docker`) on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::Config` if the binary cannot be found.
    pub fn locate(runtime: &str, verbose: bool) -> Result<Self> {
        let binary = which::which(runtime).map_err(|e| KilnError::Config {
            message: format!("container runtime '{runtime}' not found: {e}"),
        })?;
        tracing::debug!(binary = %binary.display(), "using container runtime");
        Ok(Self::new(binary, verbose))
    }

    /// Path of the runtime binary.
    #[must_use]
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    fn run(&self, operation: &'static str, image: &str, args: &[&str]) -> Result<()> {
        tracing::debug!(binary = %self.binary.display(), ?args, "spawning runtime");
        let stdout = if self.verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        };
        let status = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| KilnError::ExternalOperationFailed {
                operation,
                image: image.to_string(),
                detail: format!("failed to spawn {}: {e}", self.binary.display()),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(KilnError::ExternalOperationFailed {
                operation,
                image: image.to_string(),
                detail: status.code().map_or_else(
                    || "terminated by signal".to_string(),
                    |code| format!("exit status {code}"),
                ),
            })
        }
    }
}

impl ContainerRuntime for DockerCli {
    fn pull(&mut self, name: &ImageName) -> Result<()> {
        tracing::info!(image = %name, "pulling image");
        self.run("pull", name.as_str(), &["pull", name.as_str()])
    }

    fn build(&mut self, image: &Image) -> Result<()> {
        tracing::info!(image = %image.name, context = %image.context.display(), "building image");
        let dockerfile = image.dockerfile.to_string_lossy();
        let context = image.context.to_string_lossy();
        self.run(
            "build",
            image.name.as_str(),
            &["build", "-t", image.name.as_str(), "-f", &*dockerfile, &*context],
        )
    }

    fn push(&mut self, name: &ImageName, registry: &str) -> Result<()> {
        let target = name.qualified(registry);
        tracing::info!(image = %name, registry, target = %target, "pushing image");
        self.run("tag", name.as_str(), &["tag", name.as_str(), target.as_str()])?;
        self.run("push", name.as_str(), &["push", target.as_str()])
    }
}

/// Runtime that performs nothing and records what would have run.
#[derive(Debug, Clone, Default)]
pub struct DryRun {
    operations: Vec<String>,
}

impl DryRun {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded operations, in call order (`pull base`, `build app`,
    /// `push app registry.local`).
    #[must_use]
    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    fn record(&mut self, operation: String) {
        tracing::info!(operation = %operation, "dry run");
        self.operations.push(operation);
    }
}

impl ContainerRuntime for DryRun {
    fn pull(&mut self, name: &ImageName) -> Result<()> {
        self.record(format!("pull {name}"));
        Ok(())
    }

    fn build(&mut self, image: &Image) -> Result<()> {
        self.record(format!("build {}", image.name));
        Ok(())
    }

    fn push(&mut self, name: &ImageName, registry: &str) -> Result<()> {
        self.record(format!("push {name} {registry}"));
        Ok(())
    }
}
