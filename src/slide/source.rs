//! Slide locations and the readers that serve them.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;
use url::Url;

use crate::error::IoError;
use crate::io::{BlockCache, LocalFileReader, RangeReader, S3RangeReader};

/// Where a slide lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideLocation {
    File(PathBuf),
    S3 { bucket: String, key: String },
}

impl SlideLocation {
    /// Parse `s3://bucket/key`, or treat anything else as a local path.
    pub fn parse(location: &str) -> Result<Self, IoError> {
        if !location.starts_with("s3://") {
            return Ok(Self::File(PathBuf::from(location)));
        }

        let invalid = |reason: &str| IoError::InvalidLocation {
            location: location.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(location).map_err(|e| invalid(&e.to_string()))?;
        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| invalid("missing bucket"))?;
        let key = url.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(invalid("missing object key"));
        }

        Ok(Self::S3 {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, Self::S3 { .. })
    }
}

impl fmt::Display for SlideLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

/// A local or S3 reader behind one type.
pub enum SourceReader {
    File(LocalFileReader),
    S3(S3RangeReader),
}

impl SourceReader {
    /// Open the location.
    ///
    /// An S3 location needs `client`; a missing client is reported as an
    /// invalid location.
    pub async fn open(location: &SlideLocation, client: Option<&Client>) -> Result<Self, IoError> {
        match location {
            SlideLocation::File(path) => Ok(Self::File(LocalFileReader::open(path).await?)),
            SlideLocation::S3 { bucket, key } => {
                let client = client.ok_or_else(|| IoError::InvalidLocation {
                    location: location.to_string(),
                    reason: "no S3 client configured".to_string(),
                })?;
                let reader = S3RangeReader::new(client.clone(), bucket.clone(), key.clone()).await?;
                Ok(Self::S3(reader))
            }
        }
    }

    /// Open the location behind a block cache.
    pub async fn open_cached(
        location: &SlideLocation,
        client: Option<&Client>,
        block_size: usize,
        capacity: usize,
    ) -> Result<BlockCache<Self>, IoError> {
        let reader = Self::open(location, client).await?;
        Ok(BlockCache::with_capacity(reader, block_size, capacity))
    }
}

#[async_trait]
impl RangeReader for SourceReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        match self {
            Self::File(r) => r.read_exact_at(offset, len).await,
            Self::S3(r) => r.read_exact_at(offset, len).await,
        }
    }

    fn size(&self) -> u64 {
        match self {
            Self::File(r) => r.size(),
            Self::S3(r) => r.size(),
        }
    }

    fn identifier(&self) -> &str {
        match self {
            Self::File(r) => r.identifier(),
            Self::S3(r) => r.identifier(),
        }
    }
}
