use super::associated::AssociatedImages;
use super::properties::PropertyStore;
use super::tiled::TiledLayout;

/// Slide state a vendor probe writes into while it commits.
///
/// A probe only touches the builder after every check has passed, so a
/// builder is either untouched or fully configured with a layout.
#[derive(Debug, Clone, Default)]
pub struct SlideBuilder {
    pub properties: PropertyStore,
    pub associated_images: AssociatedImages,
    pub layout: Option<TiledLayout>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a level table has been installed.
    pub fn is_configured(&self) -> bool {
        self.layout.is_some()
    }
}
