//! Image downscaling and re-encoding
//!
//! Shrinks decoded rasters to fit a bounding box on a per-call canvas and
//! re-encodes them in the input's media type as a base64 data URL.

pub mod canvas;
pub mod downscaler;
pub mod mock;

pub use canvas::Canvas;
pub use downscaler::ImageDownscaler;
pub use mock::MockImageCompressor;

use crate::models::{CompressionRequest, Dimensions, EncodedResult};
use crate::Result;
use async_trait::async_trait;
use std::fmt;

#[async_trait]
pub trait ImageCompressor: Send + Sync {
    async fn compress(&self, request: CompressionRequest) -> Result<EncodedResult>;
}

/// Pipeline progression of one compression call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Decoding,
    Resizing,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reading => "reading",
            Stage::Decoding => "decoding",
            Stage::Resizing => "resizing",
            Stage::Encoding => "encoding",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Compute the output size for `natural` inside a `max_width` x `max_height` box.
///
/// Only the long axis is checked against its matching bound (width wins
/// ties); the short axis follows proportionally and may still exceed the
/// other bound when the box and the image have opposite orientations.
/// Scaled axes are rounded to nearest and never drop below one pixel.
pub fn fit_within(natural: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    let Dimensions { width, height } = natural;

    let (long, bound) = if width >= height {
        (width, max_width)
    } else {
        (height, max_height)
    };

    if long <= bound {
        return natural;
    }

    let scale = f64::from(bound) / f64::from(long);
    let scaled = |axis: u32| ((f64::from(axis) * scale).round() as u32).max(1);

    if width >= height {
        Dimensions::new(bound, scaled(height))
    } else {
        Dimensions::new(scaled(width), bound)
    }
}
