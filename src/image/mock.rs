use super::{fit_within, ImageCompressor};
use crate::models::{CompressionRequest, Dimensions, EncodedResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Compressor that skips decoding and echoes the payload back.
///
/// The reported dimensions come from applying the sizing policy to the
/// configured natural size, so callers can still check the bounds they pass.
pub struct MockImageCompressor {
    compress_count: Arc<Mutex<usize>>,
    natural: Dimensions,
    should_fail: Arc<Mutex<bool>>,
    last_request: Arc<Mutex<Option<(u32, u32, f32)>>>,
}

impl MockImageCompressor {
    pub fn new() -> Self {
        Self {
            compress_count: Arc::new(Mutex::new(0)),
            natural: Dimensions::new(1200, 800),
            should_fail: Arc::new(Mutex::new(false)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_natural_size(mut self, width: u32, height: u32) -> Self {
        self.natural = Dimensions::new(width, height);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_compress_count(&self) -> usize {
        *self.compress_count.lock().unwrap()
    }

    /// Bounds and quality of the most recent request.
    pub fn get_last_request(&self) -> Option<(u32, u32, f32)> {
        *self.last_request.lock().unwrap()
    }
}

impl Default for MockImageCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCompressor for MockImageCompressor {
    async fn compress(&self, request: CompressionRequest) -> Result<EncodedResult> {
        request.validate()?;

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Decode("Mock failure".to_string()));
        }

        *self.compress_count.lock().unwrap() += 1;
        *self.last_request.lock().unwrap() =
            Some((request.max_width, request.max_height, request.quality));

        let target = fit_within(self.natural, request.max_width, request.max_height);
        Ok(EncodedResult::new(
            &request.source.media_type,
            target,
            &request.source.bytes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageBlob;

    fn request() -> CompressionRequest {
        CompressionRequest::new(ImageBlob::new(b"fake image".to_vec(), "image/png"))
    }

    #[tokio::test]
    async fn test_mock_compressor() {
        let compressor = MockImageCompressor::new();

        let result = compressor.compress(request()).await.unwrap();

        assert_eq!(result.media_type, "image/png");
        assert_eq!(result.dimensions, Dimensions::new(300, 200));
        assert_eq!(result.to_blob().unwrap().bytes, b"fake image");
        assert_eq!(compressor.get_compress_count(), 1);
        assert_eq!(compressor.get_last_request(), Some((300, 300, 0.7)));
    }

    #[tokio::test]
    async fn test_mock_with_natural_size() {
        let compressor = MockImageCompressor::new().with_natural_size(200, 2000);

        let result = compressor.compress(request()).await.unwrap();
        assert_eq!(result.dimensions, Dimensions::new(30, 300));
    }

    #[tokio::test]
    async fn test_mock_with_failure() {
        let compressor = MockImageCompressor::new().with_failure(true);

        let result = compressor.compress(request()).await;
        assert!(matches!(result, Err(Error::Decode(_))));
        assert_eq!(compressor.get_compress_count(), 0);
    }
}
