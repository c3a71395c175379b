//! Format parsers for Whole Slide Image files.
//!
//! Slides are TIFF or BigTIFF containers. [`tiff`] reads the container
//! structure, [`vendor`] decides which vendor wrote it and where its pyramid
//! lives, and [`xml`] parses the XML descriptors vendors embed in
//! ImageDescription.
//!
//! Currently supported vendors:
//!
//! - **Leica SCN**: BigTIFF with a namespaced XML descriptor in the first
//!   directory

pub mod jpeg;
pub mod levels;
pub mod tiff;
pub mod vendor;
pub mod xml;

pub use levels::{Level, LevelTable};
pub use vendor::{detect_vendor, registered_vendors, ProbeOutcome, VendorProbe};
pub use xml::{Element, QueryContext, XmlDocument};
