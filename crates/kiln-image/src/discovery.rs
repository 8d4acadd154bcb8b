//! Image discovery.
//!
//! Every file named `Dockerfile` below a configured directory defines one
//! image. The image is named after its directory relative to the search
//! root, so `images/apps/web/Dockerfile` searched from `images` becomes
//! `apps/web`.

use std::path::{Component, Path, PathBuf};

use kiln_common::config::BuildConfig;
use kiln_common::constants::DOCKERFILE_NAME;
use kiln_common::error::{KilnError, Result};
use kiln_common::types::ImageName;
use walkdir::{DirEntry, WalkDir};

use crate::dockerfile::Dockerfile;
use crate::image::Image;

/// Source of image definitions for a build run.
pub trait Discovery {
    /// Directories (or other locations) this source searches, for reporting.
    fn locations(&self) -> Vec<PathBuf>;

    /// Returns every image definition found, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if a location cannot be traversed or a definition
    /// cannot be read.
    fn discover(&self) -> Result<Vec<Image>>;
}

/// Discovers images from Dockerfiles on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    directories: Vec<PathBuf>,
    namespace: Option<String>,
}

impl FsDiscovery {
    /// Creates a discovery over `directories`, prefixing names with
    /// `namespace` when given.
    #[must_use]
    pub const fn new(directories: Vec<PathBuf>, namespace: Option<String>) -> Self {
        Self {
            directories,
            namespace,
        }
    }

    /// Creates a discovery from the `directories` and `core.namespace`
    /// settings.
    #[must_use]
    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.directories.clone(), config.core.namespace.clone())
    }

    fn index(&self, root: &Path, dockerfile: &Path) -> Result<Image> {
        let name = self.image_name(root, dockerfile)?;
        let parsed = Dockerfile::read(dockerfile)?;
        tracing::debug!(
            image = %name,
            dockerfile = %dockerfile.display(),
            dependencies = ?parsed.dependencies,
            "indexed image"
        );
        let dependencies = parsed.dependencies.into_iter().map(ImageName::from).collect();
        Ok(Image::new(name, dockerfile, dependencies))
    }

    fn image_name(&self, root: &Path, dockerfile: &Path) -> Result<String> {
        let dir = dockerfile.parent().unwrap_or(root);
        let relative = dir.strip_prefix(root).unwrap_or(dir);
        let mut parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            let canonical = root.canonicalize().map_err(|e| KilnError::Io {
                path: root.to_path_buf(),
                source: e,
            })?;
            let last = canonical
                .file_name()
                .ok_or_else(|| KilnError::Config {
                    message: format!("cannot name image at {}", dockerfile.display()),
                })?;
            parts.push(last.to_string_lossy().into_owned());
        }

        let name = parts.join("/");
        Ok(match &self.namespace {
            Some(ns) => format!("{ns}/{name}"),
            None => name,
        })
    }
}

impl Discovery for FsDiscovery {
    fn locations(&self) -> Vec<PathBuf> {
        self.directories.clone()
    }

    fn discover(&self) -> Result<Vec<Image>> {
        let mut images: Vec<Image> = Vec::new();

        for root in &self.directories {
            if !root.is_dir() {
                tracing::warn!(directory = %root.display(), "not a directory, skipping");
                continue;
            }
            tracing::info!(directory = %root.display(), "indexing images");

            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

            for entry in walker {
                let entry = entry.map_err(|e| walk_error(root, e))?;
                if !entry.file_type().is_file() || entry.file_name() != DOCKERFILE_NAME {
                    continue;
                }
                let image = self.index(root, entry.path())?;
                if let Some(existing) = images.iter_mut().find(|i| i.name == image.name) {
                    tracing::warn!(
                        image = %image.name,
                        previous = %existing.dockerfile.display(),
                        replacement = %image.dockerfile.display(),
                        "image defined more than once, using the later definition"
                    );
                    *existing = image;
                } else {
                    images.push(image);
                }
            }
        }

        Ok(images)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn walk_error(root: &Path, err: walkdir::Error) -> KilnError {
    let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    KilnError::Io {
        path,
        source: err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    fn names(images: &[Image]) -> Vec<&str> {
        images.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn discovers_nested_dockerfiles_in_sorted_order() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        write(dir.path(), "base/Dockerfile", "FROM debian:bookworm\n");
        write(dir.path(), "apps/web/Dockerfile", "FROM base\n");
        write(dir.path(), "apps/api/Dockerfile", "FROM base\nCOPY --from=tools /x /x\n");
        write(dir.path(), "apps/api/README.md", "not an image");

        let images = FsDiscovery::new(vec![dir.path().to_path_buf()], None)
            .discover()
            .expect("discover failed");

        assert_eq!(names(&images), vec!["apps/api", "apps/web", "base"]);
        let api = &images[0];
        assert_eq!(api.dependencies, vec![ImageName::new("base"), ImageName::new("tools")]);
        assert_eq!(api.context, dir.path().join("apps/api"));
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        write(dir.path(), "app/Dockerfile", "FROM alpine\n");
        write(dir.path(), ".git/hooks/Dockerfile", "FROM nope\n");

        let images = FsDiscovery::new(vec![dir.path().to_path_buf()], None)
            .discover()
            .expect("discover failed");
        assert_eq!(names(&images), vec!["app"]);
    }

    #[test]
    fn namespace_prefixes_names() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        write(dir.path(), "base/Dockerfile", "FROM alpine\n");

        let images = FsDiscovery::new(vec![dir.path().to_path_buf()], Some("acme".into()))
            .discover()
            .expect("discover failed");
        assert_eq!(names(&images), vec!["acme/base"]);
    }

    #[test]
    fn root_dockerfile_is_named_after_directory() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let root = dir.path().join("service");
        write(&root, "Dockerfile", "FROM alpine\n");

        let images = FsDiscovery::new(vec![root], None)
            .discover()
            .expect("discover failed");
        assert_eq!(names(&images), vec!["service"]);
    }

    #[test]
    fn missing_directory_is_skipped() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        write(dir.path(), "app/Dockerfile", "FROM alpine\n");

        let images = FsDiscovery::new(
            vec![dir.path().join("missing"), dir.path().to_path_buf()],
            None,
        )
        .discover()
        .expect("discover failed");
        assert_eq!(names(&images), vec!["app"]);
    }

    #[test]
    fn empty_directory_discovers_nothing() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let images = FsDiscovery::new(vec![dir.path().to_path_buf()], None)
            .discover()
            .expect("discover failed");
        assert!(images.is_empty());
    }

    #[test]
    fn later_definition_replaces_earlier_in_place() {
        let first = tempfile::tempdir().expect("failed to create tempdir");
        let second = tempfile::tempdir().expect("failed to create tempdir");
        write(first.path(), "base/Dockerfile", "FROM alpine\n");
        write(first.path(), "tool/Dockerfile", "FROM alpine\n");
        write(second.path(), "base/Dockerfile", "FROM debian\n");

        let images = FsDiscovery::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            None,
        )
        .discover()
        .expect("discover failed");
        assert_eq!(names(&images), vec!["base", "tool"]);
        assert_eq!(images[0].dependencies, vec![ImageName::new("debian")]);
    }

    #[test]
    fn invalid_dockerfile_fails_discovery() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        write(dir.path(), "broken/Dockerfile", "RUN true\n");
        let result = FsDiscovery::new(vec![dir.path().to_path_buf()], None).discover();
        assert!(matches!(result, Err(KilnError::Dockerfile { .. })));
    }
}
