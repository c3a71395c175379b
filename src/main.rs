//! wsi-inspect - Print the properties of Whole Slide Images.
//!
//! Opens each slide given on the command line and writes its properties to
//! stdout. Diagnostics go to stderr.

use std::process::ExitCode;

use aws_sdk_s3::Client;
use clap::Parser;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_inspect::{
    config::{Config, OutputFormat},
    create_s3_client, BlockCache, FormatError, Slide, SlideLocation, SourceReader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.log_filter());

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    run(config).await
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(config: Config) -> ExitCode {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "wsi-inspect".to_string());

    let mut locations = Vec::with_capacity(config.slides.len());
    for slide in &config.slides {
        locations.push((slide.as_str(), SlideLocation::parse(slide)));
    }

    let client = if locations
        .iter()
        .any(|(_, l)| matches!(l, Ok(location) if location.is_s3()))
    {
        Some(create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await)
    } else {
        None
    };

    let mut failed = false;
    for (name, location) in locations {
        let result = match location {
            Ok(location) => inspect(&config, &location, client.as_ref()).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(slide) => print_slide(name, &slide, config.format),
            Err(e) => {
                failed = true;
                eprintln!("{}: {}: {}", program, name, e);
            }
        }
    }

    if failed && config.strict {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn inspect(
    config: &Config,
    location: &SlideLocation,
    client: Option<&Client>,
) -> Result<Slide<BlockCache<SourceReader>>, FormatError> {
    debug!(slide = %location, "Opening slide");
    let reader =
        SourceReader::open_cached(location, client, config.block_size, config.cache_blocks)
            .await?;
    Slide::open(reader).await
}

fn print_slide<R>(name: &str, slide: &Slide<R>, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for (key, value) in slide.properties().iter() {
                println!("{}: '{}'", key, value);
            }
        }
        OutputFormat::Json => {
            let properties: Map<String, Value> = slide
                .properties()
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect();
            let associated: Vec<Value> = slide
                .associated_images()
                .names()
                .filter_map(|n| slide.associated_images().get(n).map(|image| (n, image)))
                .map(|(n, image)| {
                    json!({
                        "name": n,
                        "width": image.width,
                        "height": image.height,
                    })
                })
                .collect();
            let levels: Vec<Value> = (0..slide.level_count())
                .filter_map(|i| slide.level(i))
                .map(|level| {
                    json!({
                        "width": level.width,
                        "height": level.height,
                        "tile_width": level.tile_width,
                        "tile_height": level.tile_height,
                        "downsample": level.downsample,
                    })
                })
                .collect();

            println!(
                "{}",
                json!({
                    "slide": name,
                    "vendor": slide.vendor(),
                    "levels": levels,
                    "associated_images": associated,
                    "properties": properties,
                })
            );
        }
    }
}
