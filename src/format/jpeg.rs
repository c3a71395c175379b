//! Abbreviated JPEG tile streams.
//!
//! Tiled TIFF writers usually store quantization and Huffman tables once,
//! in the directory's `JPEGTables` tag, and leave them out of each tile.
//! Such a tile only decodes after the shared tables are spliced in:
//!
//! ```text
//! tables: SOI DQT DHT ... EOI
//! tile:   SOI SOF SOS <scan> EOI
//! merged: SOI DQT DHT ... SOF SOS <scan> EOI
//! ```

use bytes::{Bytes, BytesMut};

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

const DHT: u8 = 0xC4;
const DQT: u8 = 0xDB;
const SOS: u8 = 0xDA;

/// Whether the stream defines a quantization or Huffman table before its
/// first scan.
///
/// Walks the marker segments after SOI; returns `false` for anything that
/// does not start with SOI.
pub fn has_tables(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        match data[pos + 1] {
            DQT | DHT => return true,
            SOS => return false,
            // Fill bytes and standalone markers carry no length
            0xFF | 0x00 | 0x01 | 0xD0..=0xD9 => pos += 2,
            _ => {
                if pos + 3 >= data.len() {
                    return false;
                }
                let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + length;
            }
        }
    }
    false
}

/// Splice `tables` into `tile`: tables without their EOI, then the tile
/// without its SOI.
pub fn merge_jpeg_tables(tables: &[u8], tile: &[u8]) -> Bytes {
    if tables.is_empty() {
        return Bytes::copy_from_slice(tile);
    }
    if tile.is_empty() {
        return Bytes::new();
    }

    let tables = tables.strip_suffix(&EOI[..]).unwrap_or(tables);
    let tile = tile.strip_prefix(&SOI[..]).unwrap_or(tile);

    let mut merged = BytesMut::with_capacity(tables.len() + tile.len());
    merged.extend_from_slice(tables);
    merged.extend_from_slice(tile);
    merged.freeze()
}

/// Complete stream for a tile, merging tables only when the tile lacks them.
pub fn prepare_tile_jpeg(tables: Option<&[u8]>, tile: &[u8]) -> Bytes {
    match tables {
        Some(tables) if !has_tables(tile) => merge_jpeg_tables(tables, tile),
        _ => Bytes::copy_from_slice(tile),
    }
}
