//! Locally defined images.

use std::path::PathBuf;

use kiln_common::types::ImageName;
use kiln_graph::DependencyRecord;
use serde::Serialize;

/// An image discovered on disk: it has a Dockerfile and must be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Name the image is tagged with.
    pub name: ImageName,
    /// Path of the Dockerfile.
    pub dockerfile: PathBuf,
    /// Build context directory (the Dockerfile's directory).
    pub context: PathBuf,
    /// Images referenced by the Dockerfile, in declaration order.
    pub dependencies: Vec<ImageName>,
}

impl Image {
    /// Creates an image record.
    #[must_use]
    pub fn new(
        name: impl Into<ImageName>,
        dockerfile: impl Into<PathBuf>,
        dependencies: Vec<ImageName>,
    ) -> Self {
        let dockerfile = dockerfile.into();
        let context = dockerfile
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        Self {
            name: name.into(),
            dockerfile,
            context,
            dependencies,
        }
    }
}

impl DependencyRecord for Image {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(ImageName::as_str)
    }
}
