//! Domain primitive types used across the kiln workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a container image as it appears in `FROM` lines and on the
/// command line (`debian:bookworm`, `apps/web`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageName(String);

impl ImageName {
    /// Creates a new image name from a string value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name prefixed with a registry host, as used for `tag`
    /// and `push`.
    ///
    /// A trailing `/` on the registry is ignored.
    #[must_use]
    pub fn qualified(&self, registry: &str) -> String {
        let registry = registry.trim_end_matches('/');
        if registry.is_empty() {
            return self.0.clone();
        }
        format!("{registry}/{}", self.0)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ImageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Verbosity of a build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-node traversal detail.
    Trace,
    /// Graph and order diagnostics; runtime output is shown.
    Debug,
    /// One line per pull, build, and push.
    #[default]
    Info,
    /// Skipped directories and overridden definitions only.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Whether child process output of the container runtime should be
    /// shown instead of discarded.
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Trace | Self::Debug)
    }

    /// Returns the directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = crate::error::KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(crate::error::KilnError::Config {
                message: format!("unknown log level: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_prefixes_registry() {
        let name = ImageName::new("apps/web");
        assert_eq!(name.qualified("registry.local:5000"), "registry.local:5000/apps/web");
    }

    #[test]
    fn qualified_ignores_trailing_slash() {
        let name = ImageName::new("base");
        assert_eq!(name.qualified("ghcr.io/acme/"), "ghcr.io/acme/base");
    }

    #[test]
    fn qualified_with_empty_registry_is_plain_name() {
        assert_eq!(ImageName::new("base").qualified(""), "base");
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().expect("parse"), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().expect("parse"), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn only_debug_and_trace_are_verbose() {
        assert!(LogLevel::Debug.is_verbose());
        assert!(LogLevel::Trace.is_verbose());
        assert!(!LogLevel::Info.is_verbose());
    }
}
