use super::BlobSource;
use crate::models::ImageBlob;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockBlobSource {
    blob: ImageBlob,
    read_count: Arc<Mutex<usize>>,
    failures_remaining: Arc<Mutex<usize>>,
    corrupt: bool,
}

impl MockBlobSource {
    pub fn new(blob: ImageBlob) -> Self {
        Self {
            blob,
            read_count: Arc::new(Mutex::new(0)),
            failures_remaining: Arc::new(Mutex::new(0)),
            corrupt: false,
        }
    }

    /// Fail the next `count` reads with `Error::Read` before succeeding.
    pub fn with_failures(self, count: usize) -> Self {
        *self.failures_remaining.lock().unwrap() = count;
        self
    }

    /// Make every read fail with `Error::Decode`, as a malformed payload would.
    pub fn with_decode_failure(mut self) -> Self {
        self.corrupt = true;
        self
    }

    pub fn get_read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }
}

#[async_trait]
impl BlobSource for MockBlobSource {
    async fn read(&self) -> Result<ImageBlob> {
        *self.read_count.lock().unwrap() += 1;

        let mut failures = self.failures_remaining.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::Read("Mock read failure".to_string()));
        }
        if self.corrupt {
            return Err(Error::Decode("Mock malformed payload".to_string()));
        }

        Ok(self.blob.clone())
    }

    fn describe(&self) -> String {
        format!("mock {} ({} bytes)", self.blob.media_type, self.blob.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_returns_blob() {
        let source = MockBlobSource::new(ImageBlob::new(b"data".to_vec(), "image/png"));

        let blob = source.read().await.unwrap();
        assert_eq!(blob.bytes, b"data");
        assert_eq!(source.get_read_count(), 1);
        assert_eq!(source.describe(), "mock image/png (4 bytes)");
    }

    #[tokio::test]
    async fn test_mock_source_fails_then_succeeds() {
        let source =
            MockBlobSource::new(ImageBlob::new(b"data".to_vec(), "image/png")).with_failures(2);

        assert!(matches!(source.read().await, Err(Error::Read(_))));
        assert!(matches!(source.read().await, Err(Error::Read(_))));
        assert!(source.read().await.is_ok());
        assert_eq!(source.get_read_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_source_decode_failure() {
        let blob = ImageBlob::new(b"data".to_vec(), "image/png");
        let source = MockBlobSource::new(blob).with_decode_failure();

        assert!(matches!(source.read().await, Err(Error::Decode(_))));
        assert_eq!(source.get_read_count(), 1);
    }
}
