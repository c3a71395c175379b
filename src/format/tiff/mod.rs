//! TIFF and BigTIFF container access.
//!
//! # Key Concepts
//!
//! - **Byte order**: declared in the header (II = little-endian, MM =
//!   big-endian); every multi-byte value is read through [`ByteOrder`].
//!
//! - **Classic TIFF vs BigTIFF**: 32-bit vs 64-bit offsets and counts. The
//!   parser handles both.
//!
//! - **Directories (IFDs)**: one per stored image. Slide formats put each
//!   pyramid level and each associated image in its own directory.
//!
//! - **Inline vs offset values**: small values sit in the IFD entry itself,
//!   larger ones are stored elsewhere in the file.

mod container;
mod parser;
mod tags;
mod validation;
mod values;

pub use container::{ContainerHandle, Directory, TiffContainer};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, TiffTag};
pub use validation::{check_directory, validate_directory, ValidationError};
pub use values::{parse_u64_array, ValueReader};
