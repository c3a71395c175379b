//! Byte access to slide containers.
//!
//! Everything above this layer reads through [`RangeReader`]; the concrete
//! sources are local files and S3 objects, usually wrapped in a
//! [`BlockCache`].

mod block_cache;
mod file_reader;
mod range_reader;
mod s3_reader;

pub use block_cache::{BlockCache, CacheStats, DEFAULT_BLOCK_CACHE_CAPACITY, DEFAULT_BLOCK_SIZE};
pub use file_reader::LocalFileReader;
pub use range_reader::RangeReader;
pub use s3_reader::{create_s3_client, S3RangeReader};
