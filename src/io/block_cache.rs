use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use lru::LruCache;
use tokio::sync::Mutex;

use super::range_reader::check_range;
use super::RangeReader;
use crate::error::IoError;

/// Default block size: 256KB
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

/// Default cache capacity in number of blocks.
pub const DEFAULT_BLOCK_CACHE_CAPACITY: usize = 64;

/// Block-aligned LRU cache in front of a RangeReader.
///
/// Loading a container issues many small reads at scattered offsets (IFD
/// headers, ASCII tags, tile offset arrays). Rounding each read out to a
/// fixed block turns those into a handful of larger fetches, which matters
/// most when the inner reader is remote.
///
/// One cache belongs to one open slide, so no request coalescing is done
/// between concurrent callers.
pub struct BlockCache<R> {
    inner: R,
    block_size: usize,
    blocks: Mutex<LruCache<u64, Bytes>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Hit/miss counters for a [`BlockCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl<R: RangeReader> BlockCache<R> {
    /// Wrap a reader with the default block size and capacity.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_CACHE_CAPACITY)
    }

    /// Wrap a reader with a custom block size and capacity (in blocks).
    ///
    /// Zero values are raised to one.
    pub fn with_capacity(inner: R, block_size: usize, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            block_size: block_size.max(1),
            blocks: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    fn inner(&self) -> &R {
        &self.inner
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn block(&self, index: u64) -> Result<Bytes, IoError> {
        if let Some(block) = self.blocks.lock().await.get(&index) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(block.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let start = index * self.block_size as u64;
        let len = (self.inner.size() - start).min(self.block_size as u64) as usize;
        let block = self.inner.read_exact_at(start, len).await?;

        self.blocks.lock().await.put(index, block.clone());
        Ok(block)
    }
}

#[async_trait]
impl<R: RangeReader> RangeReader for BlockCache<R> {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.inner.size())?;
        if len == 0 {
            return Ok(Bytes::new());
        }

        let block_size = self.block_size as u64;
        let first = offset / block_size;
        let last = (offset + len as u64 - 1) / block_size;

        if first == last {
            let block = self.block(first).await?;
            let start = (offset % block_size) as usize;
            return Ok(block.slice(start..start + len));
        }

        let mut out = BytesMut::with_capacity(len);
        let mut position = offset;
        for index in first..=last {
            let block = self.block(index).await?;
            let start = (position % block_size) as usize;
            let take = (block.len() - start).min(len - out.len());
            out.extend_from_slice(&block[start..start + take]);
            position += take as u64;
        }
        Ok(out.freeze())
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn identifier(&self) -> &str {
        self.inner.identifier()
    }
}
