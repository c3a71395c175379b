//! Opening a slide: container load, vendor detection, level loading.

use bytes::Bytes;
use image::RgbImage;
use tracing::{debug, info};

use crate::error::{FormatError, TileError};
use crate::format::tiff::TiffContainer;
use crate::format::vendor::detect_vendor;
use crate::io::RangeReader;

use super::associated::AssociatedImages;
use super::builder::SlideBuilder;
use super::hash::QuickHash;
use super::properties::{PropertyStore, PROPERTY_NAME_QUICKHASH1};
use super::tiled::{generic_tiff_tilereader, TiledLevel};

/// Upper bound on the tile bytes hashed for `openslide.quickhash-1`.
pub const MAX_QUICKHASH_BYTES: u64 = 5 << 20;

/// An opened slide.
///
/// Owns its byte source; tiles are fetched on demand through it.
pub struct Slide<R> {
    reader: R,
    vendor: &'static str,
    levels: Vec<TiledLevel>,
    properties: PropertyStore,
    associated_images: AssociatedImages,
}

impl<R: RangeReader> Slide<R> {
    /// Open a slide from a byte source.
    ///
    /// Fails with [`FormatError::Unrecognized`] when no vendor backend
    /// claims the container.
    pub async fn open(reader: R) -> Result<Self, FormatError> {
        let mut container = TiffContainer::load(&reader).await?;

        let mut builder = SlideBuilder::new();
        let mut quickhash = QuickHash::new();
        let vendor = detect_vendor(&mut container, &mut builder, Some(&mut quickhash))?;

        let SlideBuilder {
            mut properties,
            associated_images,
            layout,
        } = builder;
        let layout = layout.ok_or(FormatError::Incomplete("no level table installed"))?;
        if layout.level_count() == 0 {
            return Err(FormatError::Incomplete("level table is empty"));
        }

        let mut levels: Vec<TiledLevel> = Vec::with_capacity(layout.level_count());
        for &directory in layout.directories() {
            let base = levels.first().map(|l| (l.width, l.height));
            levels.push(TiledLevel::load(&reader, &container, directory, base).await?);
        }

        if let Some(lowest) = levels.last() {
            hash_level_tiles(&reader, lowest, &mut quickhash).await?;
        }
        properties.insert(PROPERTY_NAME_QUICKHASH1, quickhash.finish());

        info!(
            slide = reader.identifier(),
            vendor,
            levels = levels.len(),
            "Opened slide"
        );

        Ok(Self {
            reader,
            vendor,
            levels,
            properties,
            associated_images,
        })
    }

    /// Raw bytes of one tile, as stored in the container.
    pub async fn read_raw_tile(&self, level: usize, x: u32, y: u32) -> Result<Bytes, TileError> {
        let info = self.checked_level(level)?;
        let index = info.tile_index(x, y).ok_or(TileError::TileOutOfBounds {
            level,
            x,
            y,
            max_x: info.tiles_x,
            max_y: info.tiles_y,
        })?;
        let (offset, length) = info.tiles.tile_location(index).ok_or(TileError::TileOutOfBounds {
            level,
            x,
            y,
            max_x: info.tiles_x,
            max_y: info.tiles_y,
        })?;

        if length == 0 {
            return Ok(Bytes::new());
        }
        Ok(self.reader.read_exact_at(offset, length as usize).await?)
    }

    /// Decoded RGB pixels of one tile.
    pub async fn read_tile(&self, level: usize, x: u32, y: u32) -> Result<RgbImage, TileError> {
        let raw = self.read_raw_tile(level, x, y).await?;
        generic_tiff_tilereader(self.checked_level(level)?, &raw)
    }

    fn checked_level(&self, level: usize) -> Result<&TiledLevel, TileError> {
        self.levels.get(level).ok_or(TileError::InvalidLevel {
            level,
            max_levels: self.levels.len(),
        })
    }
}

impl<R> Slide<R> {
    pub fn vendor(&self) -> &'static str {
        self.vendor
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn associated_images(&self) -> &AssociatedImages {
        &self.associated_images
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&TiledLevel> {
        self.levels.get(level)
    }

    /// Level 0 dimensions.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.levels.first().map(|l| (l.width, l.height))
    }
}

async fn hash_level_tiles<R: RangeReader + ?Sized>(
    reader: &R,
    level: &TiledLevel,
    quickhash: &mut QuickHash,
) -> Result<(), FormatError> {
    let total = level.tiles.total_bytes();
    if total > MAX_QUICKHASH_BYTES {
        return Err(FormatError::Quickhash(format!(
            "lowest resolution level (directory {}) has {} bytes of tiles, limit is {}",
            level.directory, total, MAX_QUICKHASH_BYTES
        )));
    }

    let tile_count = level.tiles_x as usize * level.tiles_y as usize;
    for (&offset, &length) in level
        .tiles
        .offsets
        .iter()
        .zip(&level.tiles.byte_counts)
        .take(tile_count)
    {
        if length == 0 {
            continue;
        }
        let bytes = reader.read_exact_at(offset, length as usize).await?;
        quickhash.hash_bytes(&bytes);
    }
    Ok(())
}

/// Whether any registered vendor backend claims the source.
///
/// Runs detection only; levels are not loaded and nothing is kept.
pub async fn can_open<R: RangeReader + ?Sized>(reader: &R) -> bool {
    let mut container = match TiffContainer::load(reader).await {
        Ok(container) => container,
        Err(e) => {
            debug!(slide = reader.identifier(), "Not a TIFF container: {}", e);
            return false;
        }
    };
    detect_vendor(&mut container, &mut SlideBuilder::new(), None).is_ok()
}
