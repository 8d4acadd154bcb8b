//! System-wide constants and default paths.

/// Configuration file looked up in the working directory when `--config`
/// is not given.
pub const DEFAULT_CONFIG_FILE: &str = "kiln.yaml";

/// File name that marks a directory as an image definition.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Container runtime binary used when none is configured.
pub const DEFAULT_RUNTIME: &str = "docker";

/// Runtimes whose CLI accepts the docker `pull`/`build`/`tag`/`push` verbs.
pub const SUPPORTED_RUNTIMES: &[&str] = &["docker", "podman"];

/// The empty base image. Never pulled and never a graph node.
pub const SCRATCH_IMAGE: &str = "scratch";

/// Directory searched when no directories are configured.
pub const DEFAULT_DIRECTORY: &str = ".";
