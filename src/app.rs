//! Application orchestration: read a source, downscale it, write the result.

use crate::image::{ImageCompressor, ImageDownscaler, Stage};
use crate::models::{CompressionRequest, Config, EncodedResult, ImageBlob};
use crate::source::{BlobSource, DataUrlSource, FileSource};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{debug, info, warn};

/// Where the encoded result ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    DataUrl,
    Json,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    media_type: &'a str,
    width: u32,
    height: u32,
    encoded_bytes: usize,
    data_url: String,
}

/// Coordinates reading, compression and output for a single image.
pub struct App {
    source: Box<dyn BlobSource>,
    compressor: Box<dyn ImageCompressor>,
    config: Config,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub source: Box<dyn BlobSource>,
    pub compressor: Box<dyn ImageCompressor>,
}

impl App {
    pub fn with_services(services: AppServices, config: Config) -> Self {
        Self {
            source: services.source,
            compressor: services.compressor,
            config,
        }
    }

    /// Build an app for `input`, which is either a `data:` URL or a file path.
    pub fn new(input: &str, config: Config) -> Self {
        let source: Box<dyn BlobSource> = if input.starts_with("data:") {
            Box::new(DataUrlSource::new(input))
        } else {
            Box::new(FileSource::new(Path::new(input)))
        };
        let compressor = Box::new(ImageDownscaler::from_config(&config));

        Self::with_services(AppServices { source, compressor }, config)
    }

    /// Read, compress and return the result without writing it anywhere.
    pub async fn compress(&self) -> Result<EncodedResult> {
        let blob = self.read_with_retry().await?;
        info!(
            "Compressing {} ({}, {} bytes) to fit {}x{} at quality {}",
            self.source.describe(),
            blob.media_type,
            blob.len(),
            self.config.max_width,
            self.config.max_height,
            self.config.quality
        );

        let request = CompressionRequest::new(blob)
            .with_bounds(self.config.max_width, self.config.max_height)
            .with_quality(self.config.quality);

        let result = self.compressor.compress(request).await?;
        info!(
            "Produced {} {} ({} bytes)",
            result.dimensions, result.media_type, result.byte_len
        );
        Ok(result)
    }

    /// Compress and write the result to `output`.
    pub async fn run(&self, output: &Output, format: OutputFormat) -> Result<EncodedResult> {
        let result = self.compress().await?;
        let rendered = render_output(&result, format)?;

        match output {
            Output::Stdout => println!("{}", rendered),
            Output::File(path) => {
                tokio::fs::write(path, rendered.as_bytes()).await?;
                info!("Wrote result to {}", path.display());
            }
        }

        Ok(result)
    }

    async fn read_with_retry(&self) -> Result<ImageBlob> {
        let strategy = FixedInterval::from_millis(self.config.read_retry_delay_ms)
            .take(self.config.read_retries);

        debug!(stage = %Stage::Reading, "Reading {}", self.source.describe());
        // Retry read failures only.
        RetryIf::spawn(
            strategy,
            || async {
                self.source.read().await.inspect_err(|e| {
                    warn!("Read of {} failed: {}", self.source.describe(), e);
                })
            },
            |e: &Error| matches!(e, Error::Read(_)),
        )
        .await
    }
}

fn render_output(result: &EncodedResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::DataUrl => Ok(result.to_data_url()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&Report {
            media_type: &result.media_type,
            width: result.dimensions.width,
            height: result.dimensions.height,
            encoded_bytes: result.byte_len,
            data_url: result.to_data_url(),
        })?),
    }
}
