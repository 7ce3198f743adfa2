//! Data models and configuration
//!
//! Defines the values flowing through a compression call (blob, request,
//! dimensions, result) and the environment-driven configuration.

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_WIDTH: u32 = 300;
pub const DEFAULT_MAX_HEIGHT: u32 = 300;
pub const DEFAULT_QUALITY: f32 = 0.7;

/// Raw image payload together with the media type it was declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Parse a `data:<media-type>;base64,<payload>` string.
    ///
    /// Only base64 payloads are accepted since image bytes are never
    /// percent-encoded in practice.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::Decode("Data URL must start with 'data:'".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::Decode("Data URL is missing the ',' separator".to_string()))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            Error::Decode("Only base64 data URLs are supported".to_string())
        })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::Decode(format!("Failed to decode base64 payload: {}", e)))?;

        Ok(Self::new(bytes, media_type))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single compression call: the payload plus its bounding box and quality.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub source: ImageBlob,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
}

impl CompressionRequest {
    pub fn new(source: ImageBlob) -> Self {
        Self {
            source,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(Error::InvalidRequest(format!(
                "Bounds must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !self.quality.is_finite() || self.quality <= 0.0 || self.quality > 1.0 {
            return Err(Error::InvalidRequest(format!(
                "Quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Re-encoded image, carried as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedResult {
    pub media_type: String,
    pub dimensions: Dimensions,
    /// Size of the encoded image before base64.
    pub byte_len: usize,
    pub data: String,
}

impl EncodedResult {
    pub fn new(media_type: &str, dimensions: Dimensions, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            dimensions,
            byte_len: bytes.len(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Turn the result back into a blob, e.g. to feed it through again.
    pub fn to_blob(&self) -> Result<ImageBlob> {
        ImageBlob::from_data_url(&self.to_data_url())
    }
}

impl fmt::Display for EncodedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.data)
    }
}

/// Resampling filter used when drawing onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> image::imageops::FilterType {
        match self {
            ResampleFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResampleFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bilinear" | "triangle" => Ok(ResampleFilter::Bilinear),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(ResampleFilter::Lanczos3),
            other => Err(format!(
                "Unknown filter '{}'. Expected one of: bilinear, catmull-rom, lanczos3",
                other
            )),
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResampleFilter::Bilinear => "bilinear",
            ResampleFilter::CatmullRom => "catmull-rom",
            ResampleFilter::Lanczos3 => "lanczos3",
        };
        f.write_str(name)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    pub filter: ResampleFilter,
    pub max_alloc_bytes: u64,
    pub read_retries: usize,
    pub read_retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            filter: ResampleFilter::default(),
            max_alloc_bytes: 512 * 1024 * 1024,
            read_retries: 2,
            read_retry_delay_ms: 200,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    /// for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            max_width: parse_var(&lookup, "DOWNSCALER_MAX_WIDTH", defaults.max_width)?,
            max_height: parse_var(&lookup, "DOWNSCALER_MAX_HEIGHT", defaults.max_height)?,
            quality: parse_var(&lookup, "DOWNSCALER_QUALITY", defaults.quality)?,
            filter: parse_var(&lookup, "DOWNSCALER_FILTER", defaults.filter)?,
            max_alloc_bytes: parse_var(
                &lookup,
                "DOWNSCALER_MAX_ALLOC_BYTES",
                defaults.max_alloc_bytes,
            )?,
            read_retries: parse_var(&lookup, "DOWNSCALER_READ_RETRIES", defaults.read_retries)?,
            read_retry_delay_ms: parse_var(
                &lookup,
                "DOWNSCALER_READ_RETRY_DELAY_MS",
                defaults.read_retry_delay_ms,
            )?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_data_url_round_trip() {
        let result = EncodedResult::new("image/png", Dimensions::new(2, 1), &[1, 2, 3, 4]);
        assert_eq!(result.to_data_url(), "data:image/png;base64,AQIDBA==");
        assert_eq!(result.to_string(), result.to_data_url());
        assert_eq!(result.byte_len, 4);

        let blob = result.to_blob().unwrap();
        assert_eq!(blob, ImageBlob::new(vec![1, 2, 3, 4], "image/png"));
    }

    #[test]
    fn test_from_data_url_rejects_malformed() {
        for url in [
            "image/png;base64,AAAA",
            "data:image/png;base64",
            "data:image/png,AAAA",
            "data:image/png;base64,@@@",
        ] {
            let err = ImageBlob::from_data_url(url).unwrap_err();
            assert!(matches!(err, Error::Decode(_)), "{} gave {:?}", url, err);
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = CompressionRequest::new(ImageBlob::new(vec![], "image/png"));
        assert_eq!(request.max_width, 300);
        assert_eq!(request.max_height, 300);
        assert_eq!(request.quality, 0.7);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let blob = ImageBlob::new(vec![], "image/png");

        let zero = CompressionRequest::new(blob.clone()).with_bounds(0, 10);
        assert!(matches!(zero.validate(), Err(Error::InvalidRequest(_))));

        for quality in [0.0, -0.5, 1.5, f32::NAN] {
            let request = CompressionRequest::new(blob.clone()).with_quality(quality);
            assert!(matches!(request.validate(), Err(Error::InvalidRequest(_))));
        }

        let full = CompressionRequest::new(blob).with_quality(1.0);
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_filter_parsing() {
        let parse = |s: &str| s.parse::<ResampleFilter>().unwrap();
        assert_eq!(parse("bilinear"), ResampleFilter::Bilinear);
        assert_eq!(parse("Lanczos3"), ResampleFilter::Lanczos3);
        assert_eq!(parse("catmull-rom"), ResampleFilter::CatmullRom);
        assert!("nearest".parse::<ResampleFilter>().is_err());
        assert_eq!(ResampleFilter::CatmullRom.to_string(), "catmull-rom");
    }

    #[test]
    fn test_config_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.max_width, 300);
        assert_eq!(config.max_height, 300);
        assert_eq!(config.filter, ResampleFilter::Bilinear);
        assert_eq!(config.read_retries, 2);
    }

    #[test]
    fn test_config_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DOWNSCALER_MAX_WIDTH", "1024"),
            ("DOWNSCALER_QUALITY", " 0.5 "),
            ("DOWNSCALER_FILTER", "lanczos3"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.max_width, 1024);
        assert_eq!(config.max_height, 300);
        assert_eq!(config.quality, 0.5);
        assert_eq!(config.filter, ResampleFilter::Lanczos3);
    }

    #[test]
    fn test_config_invalid_value() {
        let err = Config::from_lookup(|key| {
            (key == "DOWNSCALER_MAX_HEIGHT").then(|| "tall".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("DOWNSCALER_MAX_HEIGHT"));
    }
}
