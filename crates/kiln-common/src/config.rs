//! Build configuration model and `kiln.yaml` loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};
use crate::types::LogLevel;

/// Root configuration for a build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Resolution and runtime settings.
    pub core: CoreConfig,
    /// Directories searched recursively for Dockerfiles.
    pub directories: Vec<PathBuf>,
    /// Registries every built image is pushed to when pushing is enabled.
    pub registries: Vec<String>,
    /// Images to build. Empty means every discovered image.
    pub images: Vec<String>,
}

/// Logging section of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level emitted; `debug` and below also show runtime output.
    pub level: LogLevel,
}

/// Core section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Also build every image that transitively depends on the requested ones.
    pub downstream: bool,
    /// Push built images to every configured registry.
    pub push: bool,
    /// Container runtime binary (`docker` or `podman`).
    pub runtime: String,
    /// Prefix joined to every discovered image name with `/`.
    pub namespace: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            downstream: false,
            push: false,
            runtime: crate::constants::DEFAULT_RUNTIME.into(),
            namespace: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            core: CoreConfig::default(),
            directories: vec![PathBuf::from(crate::constants::DEFAULT_DIRECTORY)],
            registries: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Parses a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or contains unknown keys.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Loads the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `kiln.yaml` in `dir` is
    /// used when present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = dir.join(crate::constants::DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            Self::load(&fallback)
        } else {
            Ok(Self::default())
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::Config` if the runtime is unsupported, pushing
    /// is enabled without registries, or no directory is configured.
    pub fn validate(&self) -> Result<()> {
        if !crate::constants::SUPPORTED_RUNTIMES.contains(&self.core.runtime.as_str()) {
            return Err(KilnError::Config {
                message: format!(
                    "unsupported runtime '{}', expected one of: {}",
                    self.core.runtime,
                    crate::constants::SUPPORTED_RUNTIMES.join(", ")
                ),
            });
        }
        if self.core.push && self.registries.is_empty() {
            return Err(KilnError::Config {
                message: "push is enabled but no registries are configured".into(),
            });
        }
        if self.directories.is_empty() {
            return Err(KilnError::Config {
                message: "no directories configured".into(),
            });
        }
        if let Some(ns) = &self.core.namespace {
            if ns.is_empty() || ns.starts_with('/') || ns.ends_with('/') {
                return Err(KilnError::Config {
                    message: format!("invalid namespace '{ns}'"),
                });
            }
        }
        Ok(())
    }
}
