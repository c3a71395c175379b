//! Test utilities for integration tests.
//!
//! An in-memory range reader with request tracking, JPEG tile generation,
//! a TIFF/BigTIFF writer, and ready-made Leica SCN fixtures.

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wsi_inspect::error::IoError;
use wsi_inspect::io::RangeReader;
use wsi_inspect::LEICA_NAMESPACE;

// =============================================================================
// Mock Range Reader with Request Tracking
// =============================================================================

/// An in-memory range reader that counts read requests.
pub struct TrackingMockReader {
    data: Bytes,
    identifier: String,
    request_count: Arc<AtomicUsize>,
}

impl TrackingMockReader {
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(data),
            identifier: identifier.into(),
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

impl Clone for TrackingMockReader {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            identifier: self.identifier.clone(),
            request_count: Arc::clone(&self.request_count),
        }
    }
}

#[async_trait]
impl RangeReader for TrackingMockReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Test JPEG Creation
// =============================================================================

/// A solid-color RGB JPEG.
pub fn create_solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

// =============================================================================
// TIFF Writer
// =============================================================================

pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRIC: u16 = 262;
pub const TAG_IMAGE_DESCRIPTION: u16 = 270;
pub const TAG_MAKE: u16 = 271;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_SOFTWARE: u16 = 305;
pub const TAG_TILE_WIDTH: u16 = 322;
pub const TAG_TILE_LENGTH: u16 = 323;
pub const TAG_TILE_OFFSETS: u16 = 324;
pub const TAG_TILE_BYTE_COUNTS: u16 = 325;

pub const COMPRESSION_JPEG: u16 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

#[derive(Clone, Debug)]
enum Value {
    Short(u16),
    Long(u32),
    Ascii(String),
}

/// One directory to be written.
#[derive(Clone, Debug, Default)]
pub struct DirectoryBuilder {
    entries: Vec<(u16, Value)>,
    tiles: Option<Vec<Vec<u8>>>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tiled 8-bit RGB directory where every tile holds `tile`.
    pub fn tiled(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        compression: u16,
        tile: Vec<u8>,
    ) -> Self {
        let tiles = (width.div_ceil(tile_width) * height.div_ceil(tile_height)) as usize;
        Self::new()
            .long(TAG_IMAGE_WIDTH, width)
            .long(TAG_IMAGE_LENGTH, height)
            .short(TAG_BITS_PER_SAMPLE, 8)
            .short(TAG_COMPRESSION, compression)
            .short(TAG_PHOTOMETRIC, 6)
            .short(TAG_SAMPLES_PER_PIXEL, 3)
            .short(TAG_TILE_WIDTH, tile_width as u16)
            .short(TAG_TILE_LENGTH, tile_height as u16)
            .with_tiles(vec![tile; tiles])
    }

    /// Image size and compression only, with no pixel data.
    pub fn plain(width: u32, height: u32, compression: u16) -> Self {
        Self::new()
            .long(TAG_IMAGE_WIDTH, width)
            .long(TAG_IMAGE_LENGTH, height)
            .short(TAG_COMPRESSION, compression)
    }

    pub fn short(self, tag: u16, value: u16) -> Self {
        self.set(tag, Value::Short(value))
    }

    pub fn long(self, tag: u16, value: u32) -> Self {
        self.set(tag, Value::Long(value))
    }

    pub fn ascii(self, tag: u16, value: &str) -> Self {
        self.set(tag, Value::Ascii(value.to_string()))
    }

    pub fn without(mut self, tag: u16) -> Self {
        self.entries.retain(|(t, _)| *t != tag);
        self
    }

    /// Replace the tile payloads; TileOffsets/TileByteCounts are written
    /// from these.
    pub fn with_tiles(mut self, tiles: Vec<Vec<u8>>) -> Self {
        self.tiles = Some(tiles);
        self
    }

    fn set(mut self, tag: u16, value: Value) -> Self {
        self.entries.retain(|(t, _)| *t != tag);
        self.entries.push((tag, value));
        self
    }
}

/// Writes a TIFF or BigTIFF file with the IFD chain linked in order.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    directories: Vec<DirectoryBuilder>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            directories: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_directory(mut self, directory: DirectoryBuilder) -> Self {
        self.directories.push(directory);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let pointer_size = if self.is_bigtiff { 8 } else { 4 };

        match self.byte_order {
            ByteOrderType::LittleEndian => out.extend(b"II"),
            ByteOrderType::BigEndian => out.extend(b"MM"),
        }
        if self.is_bigtiff {
            self.push(&mut out, 43, 2);
            self.push(&mut out, 8, 2);
            self.push(&mut out, 0, 2);
        } else {
            self.push(&mut out, 42, 2);
        }
        let mut next_pointer = out.len();
        self.push(&mut out, 0, pointer_size);

        for directory in &self.directories {
            let mut entries: Vec<(u16, u16, u64, Vec<u8>)> = directory
                .entries
                .iter()
                .map(|(tag, value)| self.encode(*tag, value))
                .collect();

            if let Some(tiles) = &directory.tiles {
                let (array_type, array_size) = if self.is_bigtiff { (16, 8) } else { (4, 4) };
                let mut offsets = Vec::new();
                let mut counts = Vec::new();
                for tile in tiles {
                    self.push(&mut offsets, out.len() as u64, array_size);
                    self.push(&mut counts, tile.len() as u64, array_size);
                    out.extend(tile);
                }
                let n = tiles.len() as u64;
                entries.push((TAG_TILE_OFFSETS, array_type, n, offsets));
                entries.push((TAG_TILE_BYTE_COUNTS, array_type, n, counts));
            }
            entries.sort_by_key(|e| e.0);

            // Out-of-line values go before the IFD
            let mut fields = Vec::with_capacity(entries.len());
            for (tag, field_type, count, bytes) in entries {
                if bytes.len() > pointer_size {
                    if out.len() % 2 == 1 {
                        out.push(0);
                    }
                    let offset = out.len() as u64;
                    out.extend(&bytes);
                    let mut field = Vec::new();
                    self.push(&mut field, offset, pointer_size);
                    fields.push((tag, field_type, count, field));
                } else {
                    let mut field = bytes;
                    field.resize(pointer_size, 0);
                    fields.push((tag, field_type, count, field));
                }
            }

            if out.len() % 2 == 1 {
                out.push(0);
            }
            let ifd_offset = out.len() as u64;
            self.patch(&mut out, next_pointer, ifd_offset, pointer_size);

            let count_size = if self.is_bigtiff { 8 } else { 2 };
            self.push(&mut out, fields.len() as u64, count_size);
            for (tag, field_type, count, field) in fields {
                self.push(&mut out, tag as u64, 2);
                self.push(&mut out, field_type as u64, 2);
                self.push(&mut out, count, pointer_size);
                out.extend(field);
            }
            next_pointer = out.len();
            self.push(&mut out, 0, pointer_size);
        }

        out
    }

    fn encode(&self, tag: u16, value: &Value) -> (u16, u16, u64, Vec<u8>) {
        let mut bytes = Vec::new();
        match value {
            Value::Short(v) => {
                self.push(&mut bytes, *v as u64, 2);
                (tag, 3, 1, bytes)
            }
            Value::Long(v) => {
                self.push(&mut bytes, *v as u64, 4);
                (tag, 4, 1, bytes)
            }
            Value::Ascii(s) => {
                bytes.extend(s.as_bytes());
                bytes.push(0);
                (tag, 2, bytes.len() as u64, bytes)
            }
        }
    }

    fn push(&self, data: &mut Vec<u8>, value: u64, size: usize) {
        let bytes = match self.byte_order {
            ByteOrderType::LittleEndian => value.to_le_bytes()[..size].to_vec(),
            ByteOrderType::BigEndian => value.to_be_bytes()[8 - size..].to_vec(),
        };
        data.extend(bytes);
    }

    fn patch(&self, data: &mut [u8], at: usize, value: u64, size: usize) {
        let mut bytes = Vec::new();
        self.push(&mut bytes, value, size);
        data[at..at + size].copy_from_slice(&bytes);
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Leica SCN Fixtures
// =============================================================================

/// An `<image>` element with one view and the given `(sizeX, sizeY, ifd)`
/// dimensions.
pub fn scn_image(view: (u32, u32), dimensions: &[(u32, u32, i64)], extra: &str) -> String {
    let dims: String = dimensions
        .iter()
        .map(|(w, h, ifd)| format!(r#"<dimension sizeX="{}" sizeY="{}" ifd="{}"/>"#, w, h, ifd))
        .collect();
    format!(
        r#"<image name="image"><view sizeX="{}" sizeY="{}" offsetX="0" offsetY="0"/>{}<pixels>{}</pixels></image>"#,
        view.0, view.1, extra, dims
    )
}

/// A complete SCN descriptor around a collection body.
pub fn scn_document(collection: (u32, u32), body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<scn xmlns="{}">
  <collection name="Leica SCN400" sizeX="{}" sizeY="{}">
    {}
  </collection>
</scn>"#,
        LEICA_NAMESPACE, collection.0, collection.1, body
    )
}

/// Descriptor for [`leica_slide`]: three main levels declared out of order
/// in directories 0-2 and a macro in directory 3.
pub fn leica_descriptor() -> String {
    scn_document(
        (4000, 3000),
        &format!(
            "<barcode>SLIDE-42</barcode>{}{}",
            scn_image(
                (1024, 768),
                &[(512, 384, 1), (1024, 768, 0), (256, 192, 2)],
                r#"<device model="Leica SCN400" version="1.5.1"/>
                   <creationDate>2012-03-08T10:12:41.95Z</creationDate>
                   <scanSettings>
                     <objectiveSettings><objective>20</objective></objectiveSettings>
                     <illuminationSettings>
                       <numericalAperture>0.4</numericalAperture>
                       <illuminationSource>brightfield</illuminationSource>
                     </illuminationSettings>
                   </scanSettings>"#,
            ),
            scn_image((4000, 3000), &[(200, 100, 3)], ""),
        ),
    )
}

/// Builder for a Leica slide with the given descriptor; directories match
/// [`leica_descriptor`].
pub fn leica_builder(description: &str, tile: Vec<u8>) -> TiffBuilder {
    TiffBuilder::new()
        .with_bigtiff(true)
        .add_directory(
            DirectoryBuilder::tiled(1024, 768, 256, 256, COMPRESSION_JPEG, tile.clone())
                .ascii(TAG_IMAGE_DESCRIPTION, description)
                .ascii(TAG_SOFTWARE, "Leica SCN400;Leica SCN 1.5.1")
                .ascii(TAG_MAKE, "Leica Microsystems"),
        )
        .add_directory(DirectoryBuilder::tiled(
            512,
            384,
            256,
            256,
            COMPRESSION_JPEG,
            tile.clone(),
        ))
        .add_directory(DirectoryBuilder::tiled(
            256,
            192,
            256,
            256,
            COMPRESSION_JPEG,
            tile,
        ))
        .add_directory(DirectoryBuilder::plain(200, 100, COMPRESSION_JPEG))
}

/// The standard Leica SCN fixture.
pub fn leica_slide() -> Vec<u8> {
    leica_builder(&leica_descriptor(), create_solid_jpeg(256, 256, [200, 40, 40])).build()
}
