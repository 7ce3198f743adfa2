use anyhow::Result;
use clap::Parser;
use image_downscaler::app::{App, Output, OutputFormat};
use image_downscaler::models::{Config, ResampleFilter};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-downscaler")]
#[command(about = "Shrink an image to fit a bounding box and print it as a data URL")]
struct CliArgs {
    /// Image file path, or an inline `data:` URL.
    #[arg(value_name = "INPUT")]
    input: String,

    /// Maximum output width in pixels.
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum output height in pixels.
    #[arg(long)]
    max_height: Option<u32>,

    /// Re-encoding quality in (0, 1]; only lossy formats use it.
    #[arg(long, value_parser = parse_quality_arg)]
    quality: Option<f32>,

    /// Resampling filter: bilinear, catmull-rom or lanczos3.
    #[arg(long, value_parser = parse_filter_arg)]
    filter: Option<ResampleFilter>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Emit a JSON report instead of the bare data URL.
    #[arg(long)]
    json: bool,
}

fn parse_quality_arg(input: &str) -> std::result::Result<f32, String> {
    let quality: f32 = input
        .parse()
        .map_err(|_| format!("Invalid quality '{}'. Expected a number", input))?;
    if quality.is_finite() && quality > 0.0 && quality <= 1.0 {
        Ok(quality)
    } else {
        Err(format!("Quality {} out of range. Expected (0, 1]", quality))
    }
}

fn parse_filter_arg(input: &str) -> std::result::Result<ResampleFilter, String> {
    input.parse()
}

impl CliArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(max_width) = self.max_width {
            config.max_width = max_width;
        }
        if let Some(max_height) = self.max_height {
            config.max_height = max_height;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(filter) = self.filter {
            config.filter = filter;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_downscaler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let output = args.output.clone().map_or(Output::Stdout, Output::File);
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::DataUrl
    };

    let app = App::new(&args.input, config);
    match app.run(&output, format).await {
        Ok(result) => {
            info!("Compressed to {} {}", result.dimensions, result.media_type);
            Ok(())
        }
        Err(e) => {
            error!("Compression failed: {}", e);
            std::process::exit(1);
        }
    }
}
