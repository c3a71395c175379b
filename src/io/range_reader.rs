use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Random-access byte source for a slide container.
///
/// Container loading and tile reads only ever ask for explicit byte ranges,
/// so a slide can live on local disk or in object storage without being
/// copied first.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Identifier used in log lines and diagnostics (a path or `s3://` URL).
    fn identifier(&self) -> &str;
}

/// Reject a range that does not fit inside a resource of `size` bytes.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<(), IoError> {
    let out_of_bounds = offset
        .checked_add(len as u64)
        .map_or(true, |end| end > size);
    if out_of_bounds {
        return Err(IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        });
    }
    Ok(())
}
