//! Slide abstraction layer.
//!
//! Vendor probes write into a [`SlideBuilder`]; [`Slide::open`] turns the
//! result into an opened slide with loaded levels:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Slide::open                │
//! │  (load container, detect, load levels)  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │        format::vendor dispatcher        │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  SlideBuilder: properties, associated   │
//! │  images, tiled layout                   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use wsi_inspect::slide::{Slide, SlideLocation, SourceReader};
//!
//! let location = SlideLocation::parse("slide.scn")?;
//! let reader = SourceReader::open(&location, None).await?;
//! let slide = Slide::open(reader).await?;
//!
//! for (name, value) in slide.properties().iter() {
//!     println!("{}: '{}'", name, value);
//! }
//! ```

mod associated;
mod builder;
mod hash;
mod open;
mod properties;
mod source;
mod tiled;

pub use associated::{AssociatedImage, AssociatedImages};
pub use builder::SlideBuilder;
pub use hash::QuickHash;
pub use open::{can_open, Slide, MAX_QUICKHASH_BYTES};
pub use properties::{
    PropertyStore, PROPERTY_NAME_COMMENT, PROPERTY_NAME_QUICKHASH1, PROPERTY_NAME_VENDOR,
};
pub use source::{SlideLocation, SourceReader};
pub use tiled::{generic_tiff_tilereader, install_tiff_levels, TileData, TiledLayout, TiledLevel};
