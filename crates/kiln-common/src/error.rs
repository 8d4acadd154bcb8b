//! Unified error types for the kiln workspace.
//!
//! Every failure is fatal to a build run. Nothing here is recovered
//! locally; errors surface to the caller unchanged.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KilnError {
    /// Discovery yielded no image definitions.
    #[error("no images found in {}", format_dirs(.directories))]
    DiscoveryEmpty {
        /// Directories that were searched.
        directories: Vec<PathBuf>,
    },

    /// A requested node does not exist in the dependency graph.
    #[error("image not found in dependency graph: {name}")]
    NodeNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// Dependency traversal reached a node that was still in progress.
    #[error("dependency cycle detected at {node}: {}", .path.join(" -> "))]
    CycleDetected {
        /// Node that closed the cycle.
        node: String,
        /// Nodes forming the cycle, starting and ending with `node`.
        path: Vec<String>,
    },

    /// A pull, build, or push against the container runtime failed.
    #[error("{operation} failed for {image}: {detail}")]
    ExternalOperationFailed {
        /// Operation that failed (`pull`, `build`, `tag`, `push`).
        operation: &'static str,
        /// Image the operation was applied to.
        image: String,
        /// Exit status or spawn error description.
        detail: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A Dockerfile could not be interpreted.
    #[error("invalid Dockerfile {path}: {message}")]
    Dockerfile {
        /// Path of the offending Dockerfile.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// YAML configuration failed to parse.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

fn format_dirs(directories: &[PathBuf]) -> String {
    if directories.is_empty() {
        return "(no directories)".into();
    }
    directories
        .iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KilnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_shows_path() {
        let err = KilnError::CycleDetected {
            node: "a".into(),
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected at a: a -> b -> a");
    }

    #[test]
    fn discovery_empty_lists_directories() {
        let err = KilnError::DiscoveryEmpty {
            directories: vec![PathBuf::from("images"), PathBuf::from("vendor")],
        };
        assert_eq!(err.to_string(), "no images found in images, vendor");
    }

    #[test]
    fn not_found_names_image() {
        let err = KilnError::NodeNotFound {
            name: "ghost".into(),
        };
        assert!(err.to_string().contains("ghost"));
    }
}
