//! Generic tiled-TIFF engine.
//!
//! A vendor probe decides *which* directories form the pyramid; this module
//! does everything that is the same for every TIFF-based vendor: it exports
//! the baseline `tiff.*` properties, loads per-level geometry and tile
//! tables, and turns raw tile bytes into pixels.

use bytes::Bytes;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

use crate::error::{TiffError, TileError};
use crate::format::jpeg::prepare_tile_jpeg;
use crate::format::tiff::{
    Compression, ContainerHandle, Ifd, TiffContainer, TiffTag, ValueReader,
};
use crate::io::RangeReader;

use super::hash::QuickHash;
use super::properties::{PropertyStore, PROPERTY_NAME_COMMENT};

// =============================================================================
// Install
// =============================================================================

/// Pyramid directories handed to the engine, widest level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledLayout {
    directories: Vec<i64>,
}

impl TiledLayout {
    pub fn directories(&self) -> &[i64] {
        &self.directories
    }

    pub fn level_count(&self) -> usize {
        self.directories.len()
    }
}

/// Install a level table.
///
/// Writes `tiff.*` properties and `openslide.comment` from directory 0,
/// then feeds each level's directory id and geometry to the quickhash.
/// The handle is left on the last level's directory.
pub fn install_tiff_levels(
    container: &mut dyn ContainerHandle,
    directories: Vec<i64>,
    properties: &mut PropertyStore,
    quickhash: Option<&mut QuickHash>,
) -> TiledLayout {
    if container.set_directory(0) {
        for (tag, suffix) in TiffTag::ASCII_PROPERTY_TAGS {
            if let Some(value) = container.ascii_tag(tag) {
                properties.insert(format!("tiff.{}", suffix), value);
            }
        }
        if let Some(description) = container.ascii_tag(TiffTag::ImageDescription) {
            properties.insert(PROPERTY_NAME_COMMENT, description);
        }
    }

    if let Some(hash) = quickhash {
        for &directory in &directories {
            if !container.set_directory(directory) {
                continue;
            }
            hash.hash_string(&format!(
                "{} {}x{} {}x{}",
                directory,
                container.image_width().unwrap_or(0),
                container.image_height().unwrap_or(0),
                container.tile_width().unwrap_or(0),
                container.tile_height().unwrap_or(0),
            ));
        }
    }

    TiledLayout { directories }
}

// =============================================================================
// Levels
// =============================================================================

/// Tile offsets, byte counts, and shared JPEG tables of one directory.
#[derive(Debug, Clone)]
pub struct TileData {
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub jpeg_tables: Option<Bytes>,
}

impl TileData {
    async fn load<R: RangeReader + ?Sized>(
        reader: &R,
        container: &TiffContainer,
        ifd: &Ifd,
    ) -> Result<Self, TiffError> {
        let values = ValueReader::new(reader, container.header());

        let offsets_entry = ifd
            .get_entry_by_tag(TiffTag::TileOffsets)
            .ok_or(TiffError::MissingTag("TileOffsets"))?;
        let counts_entry = ifd
            .get_entry_by_tag(TiffTag::TileByteCounts)
            .ok_or(TiffError::MissingTag("TileByteCounts"))?;

        let offsets = values.read_u64_array(offsets_entry).await?;
        let byte_counts = values.read_u64_array(counts_entry).await?;
        let jpeg_tables = match ifd.get_entry_by_tag(TiffTag::JpegTables) {
            Some(entry) => Some(values.read_bytes(entry).await?),
            None => None,
        };

        Ok(Self {
            offsets,
            byte_counts,
            jpeg_tables,
        })
    }

    /// `(offset, byte_count)` of a tile.
    pub fn tile_location(&self, tile_index: u32) -> Option<(u64, u64)> {
        let i = tile_index as usize;
        Some((*self.offsets.get(i)?, *self.byte_counts.get(i)?))
    }

    /// Sum of all tile byte counts.
    pub fn total_bytes(&self) -> u64 {
        self.byte_counts.iter().fold(0u64, |acc, &n| acc.saturating_add(n))
    }
}

/// One pyramid level with the geometry and tables needed to read tiles.
#[derive(Debug, Clone)]
pub struct TiledLevel {
    pub directory: i64,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// Relative to level 0 (1.0 for level 0)
    pub downsample: f64,
    pub compression: u16,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub tiles: TileData,
}

impl TiledLevel {
    /// Load a level's geometry and tile tables.
    ///
    /// `base` is the level-0 size used for the downsample; `None` means
    /// this is level 0.
    pub async fn load<R: RangeReader + ?Sized>(
        reader: &R,
        container: &TiffContainer,
        directory: i64,
        base: Option<(u32, u32)>,
    ) -> Result<Self, TiffError> {
        let ifd = &container
            .directory(directory)
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag: "directory",
                message: format!("directory {} does not exist", directory),
            })?
            .ifd;
        let bo = container.header().byte_order;

        let width = ifd.image_width(bo).ok_or(TiffError::MissingTag("ImageWidth"))?;
        let height = ifd.image_height(bo).ok_or(TiffError::MissingTag("ImageLength"))?;
        let tile_width = ifd.tile_width(bo).ok_or(TiffError::MissingTag("TileWidth"))?;
        let tile_height = ifd.tile_height(bo).ok_or(TiffError::MissingTag("TileLength"))?;
        if tile_width == 0 || tile_height == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: "TileWidth/TileLength",
                message: format!("{}x{}", tile_width, tile_height),
            });
        }
        let compression = ifd.compression(bo).ok_or(TiffError::MissingTag("Compression"))?;

        let values = ValueReader::new(reader, container.header());
        // TIFF defaults: one sample of one bit
        let samples_per_pixel = ifd
            .get_entry_by_tag(TiffTag::SamplesPerPixel)
            .and_then(|e| e.inline_u32(bo))
            .map_or(Ok(1), |v| narrow_u16("SamplesPerPixel", v as u64))?;
        let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => match values.read_u64_array(entry).await?.first() {
                Some(&v) => narrow_u16("BitsPerSample", v)?,
                None => 1,
            },
            None => 1,
        };

        let tiles_x = width.div_ceil(tile_width);
        let tiles_y = height.div_ceil(tile_height);

        let tiles = TileData::load(reader, container, ifd).await?;
        let expected = tiles_x as u64 * tiles_y as u64;
        if (tiles.offsets.len() as u64) < expected || (tiles.byte_counts.len() as u64) < expected {
            return Err(TiffError::InvalidTagValue {
                tag: "TileOffsets",
                message: format!(
                    "directory {} needs {} tiles, has {} offsets and {} byte counts",
                    directory,
                    expected,
                    tiles.offsets.len(),
                    tiles.byte_counts.len()
                ),
            });
        }

        let downsample = match base {
            Some((w0, h0)) if width > 0 && height > 0 => {
                (w0 as f64 / width as f64 + h0 as f64 / height as f64) / 2.0
            }
            _ => 1.0,
        };

        Ok(Self {
            directory,
            width,
            height,
            tile_width,
            tile_height,
            tiles_x,
            tiles_y,
            downsample,
            compression,
            samples_per_pixel,
            bits_per_sample,
            tiles,
        })
    }

    /// Row-major tile index, or `None` when out of range.
    pub fn tile_index(&self, tile_x: u32, tile_y: u32) -> Option<u32> {
        if tile_x >= self.tiles_x || tile_y >= self.tiles_y {
            return None;
        }
        Some(tile_y * self.tiles_x + tile_x)
    }

    /// Pixel size of the image area a tile covers; edge tiles are clipped.
    pub fn tile_dimensions(&self, tile_x: u32, tile_y: u32) -> Option<(u32, u32)> {
        self.tile_index(tile_x, tile_y)?;
        let w = (self.width - tile_x * self.tile_width).min(self.tile_width);
        let h = (self.height - tile_y * self.tile_height).min(self.tile_height);
        Some((w, h))
    }
}

/// Sample-format tags are SHORT per TIFF; wider values are rejected.
fn narrow_u16(tag: &'static str, value: u64) -> Result<u16, TiffError> {
    u16::try_from(value).map_err(|_| TiffError::InvalidTagValue {
        tag,
        message: format!("{} does not fit in 16 bits", value),
    })
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one tile's raw bytes into RGB pixels.
///
/// The result is always a full `tile_width` x `tile_height` tile, as
/// stored; clipping edge tiles is up to the caller.
pub fn generic_tiff_tilereader(level: &TiledLevel, raw: &[u8]) -> Result<RgbImage, TileError> {
    match Compression::from_u16(level.compression) {
        Some(Compression::Jpeg) => {
            let stream = prepare_tile_jpeg(level.tiles.jpeg_tables.as_deref(), raw);
            let image = image::load_from_memory_with_format(&stream, ImageFormat::Jpeg)
                .map_err(|e| TileError::Decode(e.to_string()))?;
            Ok(image.to_rgb8())
        }
        Some(Compression::None) => decode_uncompressed(level, raw),
        Some(other) => Err(TileError::UnsupportedCompression(other.name().to_string())),
        None => Err(TileError::UnsupportedCompression(format!(
            "compression {}",
            level.compression
        ))),
    }
}

fn decode_uncompressed(level: &TiledLevel, raw: &[u8]) -> Result<RgbImage, TileError> {
    if level.bits_per_sample != 8 {
        return Err(TileError::UnsupportedCompression(format!(
            "uncompressed {}-bit samples",
            level.bits_per_sample
        )));
    }

    let (w, h) = (level.tile_width, level.tile_height);
    let pixels = w as usize * h as usize;
    let spp = level.samples_per_pixel as usize;
    if raw.len() < pixels * spp {
        return Err(TileError::Decode(format!(
            "tile has {} bytes, expected {}",
            raw.len(),
            pixels * spp
        )));
    }

    let image = match spp {
        1 => GrayImage::from_raw(w, h, raw[..pixels].to_vec())
            .map(|g| DynamicImage::ImageLuma8(g).to_rgb8()),
        3 => RgbImage::from_raw(w, h, raw[..pixels * 3].to_vec()),
        _ => {
            return Err(TileError::UnsupportedCompression(format!(
                "uncompressed with {} samples per pixel",
                spp
            )))
        }
    };
    image.ok_or_else(|| TileError::Decode("tile buffer has the wrong size".to_string()))
}
