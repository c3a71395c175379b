//! Reading tag values that live inline or out of line.
//!
//! Array values (TileOffsets, TileByteCounts) are fetched with a single
//! range read each; on remote storage that is the difference between one
//! request and thousands.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

/// Reads tag values through a RangeReader, honoring the header's byte order.
pub struct ValueReader<'a, R: RangeReader + ?Sized> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader + ?Sized> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Raw value bytes: sliced from the entry when inline, fetched otherwise.
    pub async fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }

        let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: "value",
            message: format!("value of {} bytes is too large", size),
        })?;
        let offset = entry.value_offset(self.header.byte_order);
        Ok(self.reader.read_exact_at(offset, len).await?)
    }

    /// Array of Short, Long, or Long8 values widened to u64.
    pub async fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry).await?;
        parse_u64_array(&bytes, field_type, self.header.byte_order).ok_or_else(|| {
            TiffError::InvalidTagValue {
                tag: "array",
                message: format!("expected Short, Long, or Long8, got {:?}", field_type),
            }
        })
    }

    /// ASCII value with the NUL terminator (and anything after it) removed.
    ///
    /// Non-UTF-8 bytes are replaced rather than rejected.
    pub async fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        match entry.field_type {
            Some(FieldType::Ascii) => {}
            Some(other) => {
                return Err(TiffError::InvalidTagValue {
                    tag: "string",
                    message: format!("expected Ascii, got {:?}", other),
                })
            }
            None => return Err(TiffError::UnknownFieldType(entry.field_type_raw)),
        }

        let bytes = self.read_bytes(entry).await?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Decode an integer array of the given field type.
///
/// Returns `None` for non-integer types. Trailing bytes that do not make a
/// whole value are ignored.
pub fn parse_u64_array(bytes: &[u8], field_type: FieldType, byte_order: ByteOrder) -> Option<Vec<u64>> {
    let values = match field_type {
        FieldType::Short => bytes
            .chunks_exact(2)
            .map(|c| byte_order.read_u16(c) as u64)
            .collect(),
        FieldType::Long => bytes
            .chunks_exact(4)
            .map(|c| byte_order.read_u32(c) as u64)
            .collect(),
        FieldType::Long8 => bytes.chunks_exact(8).map(|c| byte_order.read_u64(c)).collect(),
        _ => return None,
    };
    Some(values)
}
