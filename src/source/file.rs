use super::BlobSource;
use crate::mime;
use crate::models::ImageBlob;
use crate::{Error, Result};
use async_trait::async_trait;
use image::ImageFormat;
use std::path::{Path, PathBuf};

const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Media type from the extension, then from the payload's signature.
    fn media_type(&self, bytes: &[u8]) -> &'static str {
        ImageFormat::from_path(&self.path)
            .ok()
            .and_then(mime::media_type_for)
            .or_else(|| mime::detect_image_mime(bytes))
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
    }
}

#[async_trait]
impl BlobSource for FileSource {
    async fn read(&self) -> Result<ImageBlob> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Read(format!("Failed to read {}: {}", self.path.display(), e)))?;

        tracing::debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        let media_type = self.media_type(&bytes);
        Ok(ImageBlob::new(bytes, media_type))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
