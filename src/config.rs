//! Configuration for the `wsi-inspect` command.
//!
//! Options come from command-line arguments via clap, with `WSI_`
//! environment variables as fallbacks:
//!
//! - `WSI_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `WSI_S3_REGION` - AWS region (default: us-east-1)
//! - `WSI_BLOCK_SIZE` - Block size in bytes for the block cache (default: 256KB)
//! - `WSI_CACHE_BLOCKS` - Max blocks cached per slide (default: 100)
//! - `WSI_FORMAT` - Output format, `text` or `json` (default: text)

use clap::{Parser, ValueEnum};

use crate::io::{DEFAULT_BLOCK_CACHE_CAPACITY, DEFAULT_BLOCK_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "wsi_inspect=warn";

/// Filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "wsi_inspect=debug";

// =============================================================================
// CLI Arguments
// =============================================================================

/// How properties are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One `name: 'value'` line per property
    #[default]
    Text,
    /// One JSON object per slide
    Json,
}

/// wsi-inspect - Print the properties of Whole Slide Images.
///
/// Each slide may be a local path or an `s3://bucket/key` URL.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-inspect")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Slide files to inspect.
    #[arg(required = true, value_name = "SLIDE")]
    pub slides: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "WSI_FORMAT")]
    pub format: OutputFormat,

    /// Exit with failure if any slide could not be opened.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "WSI_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "WSI_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Block size in bytes for the block cache.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, env = "WSI_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks to cache per slide.
    #[arg(long, default_value_t = DEFAULT_BLOCK_CACHE_CAPACITY, env = "WSI_CACHE_BLOCKS")]
    pub cache_blocks: usize,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level) on stderr.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.slides.iter().any(|s| s.is_empty()) {
            return Err("slide locations must not be empty".to_string());
        }

        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }

        if self.block_size < 1024 || self.block_size > 16 * 1024 * 1024 {
            return Err("block_size must be between 1KB and 16MB".to_string());
        }

        if self.s3_region.is_empty() {
            return Err("S3 region must not be empty. Set --s3-region or WSI_S3_REGION".to_string());
        }

        Ok(())
    }

    /// Log filter for the subscriber when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
