//! # WSI Inspect
//!
//! Opens vendor Whole Slide Image files as validated multi-resolution
//! pyramids and exposes their properties, associated images and tiles.
//!
//! Slides are read through byte ranges, so a file can live on local disk or
//! in S3-compatible object storage without being downloaded first.
//!
//! ## Features
//!
//! - **Vendor detection**: Registered vendor backends are tried in order
//!   and the first to claim a container configures the slide
//! - **Leica SCN**: XML descriptor parsing, pyramid ordering, macro image
//!   selection and directory validation
//! - **Quickhash**: `openslide.quickhash-1` identifies slide content
//! - **Range-based streaming**: Local files and S3 objects behind an LRU
//!   block cache
//!
//! ## Architecture
//!
//! - [`io`] - Range readers and block caching
//! - [`mod@format`] - TIFF container, XML descriptors, vendor backends
//! - [`slide`] - Slide opening, properties, tiled levels
//! - [`config`] - CLI configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_inspect::{Slide, SlideLocation, SourceReader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let location = SlideLocation::parse("slide.scn")?;
//!     let reader = SourceReader::open(&location, None).await?;
//!     let slide = Slide::open(reader).await?;
//!
//!     println!("vendor: {}", slide.vendor());
//!     for (name, value) in slide.properties().iter() {
//!         println!("{}: '{}'", name, value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod slide;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use error::{FormatError, IoError, TiffError, TileError, VendorError, XmlError};
pub use format::tiff::{
    ContainerHandle, TiffContainer, TiffTag, ValidationError, BIGTIFF_HEADER_SIZE,
    TIFF_HEADER_SIZE,
};
pub use format::vendor::{LeicaProbe, LEICA_NAMESPACE};
pub use format::{detect_vendor, registered_vendors, Level, LevelTable, ProbeOutcome, VendorProbe};
pub use io::{create_s3_client, BlockCache, LocalFileReader, RangeReader, S3RangeReader};
pub use slide::{
    can_open, PropertyStore, QuickHash, Slide, SlideBuilder, SlideLocation, SourceReader,
    PROPERTY_NAME_COMMENT, PROPERTY_NAME_QUICKHASH1, PROPERTY_NAME_VENDOR,
};
