//! Associated images (macro, label, thumbnail) stored alongside the pyramid.

use std::collections::BTreeMap;

use crate::format::tiff::ContainerHandle;

/// An associated image backed by a single container directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedImage {
    pub directory: i64,
    pub width: u32,
    pub height: u32,
}

/// Associated images keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociatedImages {
    images: BTreeMap<String, AssociatedImage>,
}

impl AssociatedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the container's current directory under `name`.
    ///
    /// Dimensions come from the directory's ImageWidth/ImageLength; when a
    /// tag is absent the declared `fallback` dimension is used.
    pub fn add_current_directory(
        &mut self,
        name: &str,
        container: &dyn ContainerHandle,
        fallback: (u32, u32),
    ) {
        let image = AssociatedImage {
            directory: container.current_directory(),
            width: container.image_width().unwrap_or(fallback.0),
            height: container.image_height().unwrap_or(fallback.1),
        };
        self.images.insert(name.to_string(), image);
    }

    pub fn get(&self, name: &str) -> Option<&AssociatedImage> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}
