use thiserror::Error;

use crate::format::tiff::ValidationError;

/// I/O errors that can occur when reading slide bytes
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Error from the local filesystem
    #[error("File error: {0}")]
    File(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Slide location could not be parsed
    #[error("Invalid slide location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },
}

/// Errors that can occur when parsing TIFF containers
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// IFD chain revisits an offset it has already parsed
    #[error("IFD chain loops back to offset {0}")]
    IfdLoop(u64),

    /// IFD chain is longer than the reader accepts
    #[error("TIFF container has more than {0} directories")]
    TooManyDirectories(usize),

    /// Container has no directories at all
    #[error("TIFF container has no directories")]
    NoDirectories,

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised while parsing a vendor XML descriptor
#[derive(Debug, Clone, Error)]
pub enum XmlError {
    /// The underlying reader rejected the document
    #[error("Malformed XML: {0}")]
    Malformed(String),

    /// Document contains no root element
    #[error("XML document has no root element")]
    NoRoot,

    /// More than one top-level element
    #[error("XML document has more than one root element")]
    MultipleRoots,

    /// Document ended while elements were still open
    #[error("XML document ended inside <{0}>")]
    UnclosedElement(String),

    /// Non-whitespace text outside the root element
    #[error("Unexpected text outside the root element")]
    TextOutsideRoot,
}

/// Structural problems found by a vendor probe after the file was
/// recognized as belonging to that vendor.
#[derive(Debug, Clone, Error)]
pub enum VendorError {
    /// Expected exactly one element at a path
    #[error("Expected exactly one <{element}> element, found {found}")]
    ElementCount { element: &'static str, found: usize },

    /// Required integer attribute missing or not a base-10 integer
    #[error("Property {attribute} not found on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// No image elements under the collection
    #[error("Can't find any images")]
    NoImages,

    /// More than one image matched the collection dimensions
    #[error("Found multiple macro images")]
    MultipleMacroImages,

    /// More than one image did not match the collection dimensions
    #[error("Found multiple main images")]
    MultipleMainImages,

    /// No image qualified as the main image
    #[error("Can't find main image node")]
    NoMainImage,

    /// An image carries no resolution entries
    #[error("Can't find any dimensions in the {image} image")]
    NoDimensions { image: &'static str },

    /// A referenced directory failed validation
    #[error(transparent)]
    Directory(#[from] ValidationError),
}

/// Errors related to opening a slide
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// No registered vendor probe claimed the file
    #[error("Not a file that can be recognized")]
    Unrecognized,

    /// A probe claimed the file but the engine state is incomplete
    #[error("Slide configuration incomplete: {0}")]
    Incomplete(&'static str),

    /// Quickhash could not be computed
    #[error("Cannot compute quickhash: {0}")]
    Quickhash(String),
}

/// Errors that can occur when reading tiles from an opened slide
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Error from the container layer
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Error from the storage layer
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Level index out of range
    #[error("Invalid level {level}: slide has {max_levels} levels")]
    InvalidLevel { level: usize, max_levels: usize },

    /// Tile coordinates out of range
    #[error("Invalid tile ({x}, {y}) at level {level}: level has {max_x}x{max_y} tiles")]
    TileOutOfBounds {
        level: usize,
        x: u32,
        y: u32,
        max_x: u32,
        max_y: u32,
    },

    /// Codec layer cannot decode the tile
    #[error("Unsupported compression for decoding: {0}")]
    UnsupportedCompression(String),

    /// Tile bytes could not be decoded
    #[error("Failed to decode tile: {0}")]
    Decode(String),
}
