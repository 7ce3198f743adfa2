use super::{fit_within, Canvas, ImageCompressor, Stage};
use crate::mime;
use crate::models::{CompressionRequest, Config, Dimensions, EncodedResult, ResampleFilter};
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader, Limits, RgbImage,
    RgbaImage,
};
use std::io::Cursor;
use tracing::debug;

/// Decodes, shrinks and re-encodes images entirely in memory.
pub struct ImageDownscaler {
    filter: ResampleFilter,
    max_alloc_bytes: u64,
}

impl ImageDownscaler {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.filter,
            max_alloc_bytes: config.max_alloc_bytes,
        }
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_alloc_bytes(mut self, max_alloc_bytes: u64) -> Self {
        self.max_alloc_bytes = max_alloc_bytes;
        self
    }

    fn decode_sync(bytes: &[u8], max_alloc_bytes: u64) -> Result<(DynamicImage, ImageFormat)> {
        if bytes.is_empty() {
            return Err(Error::Decode("Image payload is empty".to_string()));
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| Error::Decode(format!("Failed to inspect image payload: {}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| Error::Decode("Unrecognized image format".to_string()))?;

        let mut limits = Limits::default();
        limits.max_alloc = Some(max_alloc_bytes);
        reader.limits(limits);

        let decode_err = |e: image::ImageError| {
            Error::Decode(format!("Failed to decode {:?} image: {}", format, e))
        };

        let mut decoder = reader.into_decoder().map_err(decode_err)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        // Natural size is the upright size, as a browser reports it.
        image.apply_orientation(orientation);

        Ok((image, format))
    }

    fn render_sync(
        image: DynamicImage,
        target: Dimensions,
        filter: ResampleFilter,
        max_alloc_bytes: u64,
    ) -> Result<DynamicImage> {
        let mut canvas = Canvas::acquire(target, max_alloc_bytes)?;
        canvas.draw(&image, filter.filter_type());
        Ok(canvas.into_image())
    }

    fn encode_sync(image: &DynamicImage, format: ImageFormat, quality: f32) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();

        match format {
            ImageFormat::Jpeg => {
                let rgb = flatten_onto_black(&image.to_rgba8());
                let mut encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality));
                encoder
                    .encode(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| Error::Render(format!("Failed to encode JPEG: {}", e)))?;
            }
            // Lossless (PNG, WebP) or palette (GIF) encoders take no quality knob.
            _ => {
                image
                    .write_to(&mut Cursor::new(&mut bytes), format)
                    .map_err(|e| Error::Render(format!("Failed to encode {:?}: {}", format, e)))?;
            }
        }

        Ok(bytes)
    }

    async fn run_pipeline(&self, request: CompressionRequest) -> Result<EncodedResult> {
        let CompressionRequest {
            source,
            max_width,
            max_height,
            quality,
        } = request;
        let declared = source.media_type;
        let bytes = source.bytes;
        let filter = self.filter;
        let max_alloc_bytes = self.max_alloc_bytes;

        let (image, detected) = run_blocking(Stage::Decoding, move || {
            Self::decode_sync(&bytes, max_alloc_bytes)
        })
        .await?;

        let output_format = output_format(&declared, detected);
        let media_type = mime::media_type_for(output_format).unwrap_or(mime::PNG);

        let natural = Dimensions::new(image.width(), image.height());
        let target = fit_within(natural, max_width, max_height);
        debug!(
            "Resizing {} {:?} to {} (bounds {}x{})",
            natural, detected, target, max_width, max_height
        );

        let rendered = run_blocking(Stage::Resizing, move || {
            Self::render_sync(image, target, filter, max_alloc_bytes)
        })
        .await?;

        let encoded = run_blocking(Stage::Encoding, move || {
            Self::encode_sync(&rendered, output_format, quality)
        })
        .await?;

        Ok(EncodedResult::new(media_type, target, &encoded))
    }
}

impl Default for ImageDownscaler {
    fn default() -> Self {
        Self::new()
    }
}

/// Declared type if we can write it, else the detected one, else PNG.
fn output_format(declared: &str, detected: ImageFormat) -> ImageFormat {
    mime::encodable_format(declared)
        .or_else(|| mime::media_type_for(detected).map(|_| detected))
        .unwrap_or_else(|| {
            debug!(
                "No encoder for declared type '{}' or detected {:?}, writing PNG",
                declared, detected
            );
            ImageFormat::Png
        })
}

/// Premultiply onto an opaque black backdrop; JPEG has no alpha channel.
fn flatten_onto_black(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let over = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

/// Map quality in (0, 1] onto the JPEG encoder's 1..=100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

async fn run_blocking<T, F>(stage: Stage, task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    debug!(stage = %stage, "Entering stage");
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        let message = format!("{} task did not complete: {}", stage, e);
        match stage {
            Stage::Decoding => Error::Decode(message),
            _ => Error::Render(message),
        }
    })?
}

#[async_trait]
impl ImageCompressor for ImageDownscaler {
    async fn compress(&self, request: CompressionRequest) -> Result<EncodedResult> {
        request.validate()?;

        let outcome = self.run_pipeline(request).await;
        match &outcome {
            Ok(result) => debug!(
                stage = %Stage::Done,
                "Encoded {} {} ({} bytes)",
                result.dimensions,
                result.media_type,
                result.byte_len
            ),
            Err(e) => debug!(stage = %Stage::Failed, "Compression failed: {}", e),
        }

        outcome
    }
}
