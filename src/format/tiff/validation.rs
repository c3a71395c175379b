//! Directory validation.
//!
//! Before a vendor probe commits a level table, every directory it
//! references must be selectable and use a compression the tile reader can
//! decode. Anything else would produce a slide that opens and then fails
//! on the first tile read.

use thiserror::Error;
use tracing::warn;

use super::container::ContainerHandle;
use super::tags::Compression;

/// Why a directory cannot back a level or associated image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cannot find TIFF directory {0}")]
    DirectoryNotFound(i64),

    #[error("Cannot read compression scheme of TIFF directory {0}")]
    MissingCompression(i64),

    #[error("Unsupported TIFF compression {compression} in directory {directory}")]
    UnsupportedCompression { directory: i64, compression: u16 },
}

/// Select `directory` and check that its compression is decodable.
///
/// On failure the handle stays at the last directory that was selected
/// successfully.
pub fn validate_directory(
    container: &mut dyn ContainerHandle,
    directory: i64,
) -> Result<(), ValidationError> {
    if !container.set_directory(directory) {
        return Err(ValidationError::DirectoryNotFound(directory));
    }

    let compression = container
        .compression()
        .ok_or(ValidationError::MissingCompression(directory))?;

    match Compression::from_u16(compression) {
        Some(c) if c.is_decodable() => Ok(()),
        _ => Err(ValidationError::UnsupportedCompression {
            directory,
            compression,
        }),
    }
}

/// Boolean form of [`validate_directory`] that logs the failure.
pub fn check_directory(container: &mut dyn ContainerHandle, directory: i64) -> bool {
    match validate_directory(container, directory) {
        Ok(()) => true,
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}
