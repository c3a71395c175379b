//! Loaded TIFF container and the directory-cursor view the probes use.
//!
//! Loading is async: the header and the whole IFD chain are read through a
//! [`RangeReader`], together with the ASCII tags of every directory. After
//! that the container answers every question a vendor probe asks without
//! touching storage, so probing stays synchronous.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::{FieldType, TiffTag};
use super::values::ValueReader;

/// Maximum number of IFDs followed in the chain
const MAX_IFDS: usize = 1 << 16;

/// Maximum entries accepted in a single IFD
const MAX_IFD_ENTRIES: u64 = 4096;

/// Cursor-style access to the directories of a tiled container.
///
/// Mirrors the classic "current directory" model: callers select a
/// directory, then query tags of whichever directory is current.
pub trait ContainerHandle {
    /// Whether the current directory is tiled.
    fn is_tiled(&self) -> bool;

    /// Number of directories in the container.
    fn directory_count(&self) -> usize;

    /// Make `directory` current. Returns `false` (leaving the cursor where
    /// it was) when the directory does not exist.
    fn set_directory(&mut self, directory: i64) -> bool;

    /// Index of the current directory.
    fn current_directory(&self) -> i64;

    /// ASCII tag of the current directory.
    fn ascii_tag(&self, tag: TiffTag) -> Option<&str>;

    /// Raw Compression value of the current directory.
    fn compression(&self) -> Option<u16>;

    fn image_width(&self) -> Option<u32>;
    fn image_height(&self) -> Option<u32>;
    fn tile_width(&self) -> Option<u32>;
    fn tile_height(&self) -> Option<u32>;
}

/// A single directory with its preloaded ASCII values.
#[derive(Debug, Clone)]
pub struct Directory {
    /// File offset of the IFD
    pub offset: u64,

    pub ifd: Ifd,

    ascii: HashMap<TiffTag, String>,
}

impl Directory {
    pub fn ascii(&self, tag: TiffTag) -> Option<&str> {
        self.ascii.get(&tag).map(String::as_str)
    }
}

/// A TIFF or BigTIFF container with every directory loaded.
#[derive(Debug, Clone)]
pub struct TiffContainer {
    header: TiffHeader,
    directories: Vec<Directory>,
    current: usize,
}

impl TiffContainer {
    /// Read the header and walk the IFD chain to its zero next-offset.
    ///
    /// An offset seen twice is an error rather than an infinite loop, and
    /// so is a chain longer than `MAX_IFDS`.
    pub async fn load<R: RangeReader + ?Sized>(reader: &R) -> Result<Self, TiffError> {
        Self::load_with_limit(reader, MAX_IFDS).await
    }

    async fn load_with_limit<R: RangeReader + ?Sized>(
        reader: &R,
        max_directories: usize,
    ) -> Result<Self, TiffError> {
        let header_len = reader.size().min(BIGTIFF_HEADER_SIZE as u64) as usize;
        let header_bytes = reader.read_exact_at(0, header_len).await?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let mut directories = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 {
            if directories.len() == max_directories {
                return Err(TiffError::TooManyDirectories(max_directories));
            }
            if !visited.insert(offset) {
                return Err(TiffError::IfdLoop(offset));
            }
            if offset >= reader.size() {
                return Err(TiffError::InvalidIfdOffset(offset));
            }

            let directory = Self::load_directory(reader, &header, offset).await?;
            offset = directory.ifd.next_ifd_offset;
            directories.push(directory);
        }

        if directories.is_empty() {
            return Err(TiffError::NoDirectories);
        }

        debug!(
            source = reader.identifier(),
            bigtiff = header.is_bigtiff,
            directories = directories.len(),
            "Loaded TIFF container"
        );

        Ok(Self {
            header,
            directories,
            current: 0,
        })
    }

    async fn load_directory<R: RangeReader + ?Sized>(
        reader: &R,
        header: &TiffHeader,
        offset: u64,
    ) -> Result<Directory, TiffError> {
        let count_bytes = reader.read_exact_at(offset, header.ifd_count_size()).await?;
        let entry_count = if header.is_bigtiff {
            header.byte_order.read_u64(&count_bytes)
        } else {
            header.byte_order.read_u16(&count_bytes) as u64
        };
        if entry_count > MAX_IFD_ENTRIES {
            return Err(TiffError::InvalidTagValue {
                tag: "IFD",
                message: format!("{} entries at offset {}", entry_count, offset),
            });
        }

        let ifd_bytes = reader
            .read_exact_at(offset, Ifd::calculate_size(entry_count, header))
            .await?;
        let ifd = Ifd::parse(&ifd_bytes, header)?;

        let values = ValueReader::new(reader, header);
        let mut ascii = HashMap::new();
        for (tag, _) in TiffTag::ASCII_PROPERTY_TAGS {
            let Some(entry) = ifd.get_entry_by_tag(tag) else {
                continue;
            };
            if entry.field_type != Some(FieldType::Ascii) {
                continue;
            }
            ascii.insert(tag, values.read_string(entry).await?);
        }

        Ok(Directory { offset, ifd, ascii })
    }

    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// Directory by index, independent of the cursor.
    pub fn directory(&self, directory: i64) -> Option<&Directory> {
        usize::try_from(directory)
            .ok()
            .and_then(|i| self.directories.get(i))
    }

    fn current(&self) -> &Directory {
        &self.directories[self.current]
    }

    fn current_u32(&self, f: impl Fn(&Ifd) -> Option<u32>) -> Option<u32> {
        f(&self.current().ifd)
    }
}

impl ContainerHandle for TiffContainer {
    fn is_tiled(&self) -> bool {
        self.current().ifd.is_tiled()
    }

    fn directory_count(&self) -> usize {
        self.directories.len()
    }

    fn set_directory(&mut self, directory: i64) -> bool {
        match usize::try_from(directory) {
            Ok(index) if index < self.directories.len() => {
                self.current = index;
                true
            }
            _ => false,
        }
    }

    fn current_directory(&self) -> i64 {
        self.current as i64
    }

    fn ascii_tag(&self, tag: TiffTag) -> Option<&str> {
        self.current().ascii(tag)
    }

    fn compression(&self) -> Option<u16> {
        self.current().ifd.compression(self.header.byte_order)
    }

    fn image_width(&self) -> Option<u32> {
        let bo = self.header.byte_order;
        self.current_u32(|ifd| ifd.image_width(bo))
    }

    fn image_height(&self) -> Option<u32> {
        let bo = self.header.byte_order;
        self.current_u32(|ifd| ifd.image_height(bo))
    }

    fn tile_width(&self) -> Option<u32> {
        let bo = self.header.byte_order;
        self.current_u32(|ifd| ifd.tile_width(bo))
    }

    fn tile_height(&self) -> Option<u32> {
        let bo = self.header.byte_order;
        self.current_u32(|ifd| ifd.tile_height(bo))
    }
}
