//! Image payload sources
//!
//! Obtains the raw bytes and declared media type of the image to compress,
//! whether it comes from disk, a `data:` URL or a test double.

pub mod file;
pub mod mock;

pub use file::FileSource;
pub use mock::MockBlobSource;

use crate::models::ImageBlob;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn read(&self) -> Result<ImageBlob>;

    /// Short human-readable label used in logs.
    fn describe(&self) -> String;
}

/// Source backed by an inline `data:<type>;base64,<payload>` string.
pub struct DataUrlSource {
    url: String,
}

impl DataUrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl BlobSource for DataUrlSource {
    async fn read(&self) -> Result<ImageBlob> {
        ImageBlob::from_data_url(&self.url)
    }

    fn describe(&self) -> String {
        let header = self.url.split(',').next().unwrap_or_default();
        format!("{} ({} chars)", header, self.url.len())
    }
}
