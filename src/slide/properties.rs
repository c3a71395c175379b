//! Slide property store.

use std::collections::BTreeMap;

/// Vendor that claimed the slide
pub const PROPERTY_NAME_VENDOR: &str = "openslide.vendor";

/// Free-form comment, taken from the first directory's ImageDescription
pub const PROPERTY_NAME_COMMENT: &str = "openslide.comment";

/// Hex digest identifying the slide's content
pub const PROPERTY_NAME_QUICKHASH1: &str = "openslide.quickhash-1";

/// String properties keyed by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    properties: BTreeMap<String, String>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.properties.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
