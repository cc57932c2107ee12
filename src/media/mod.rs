//! Image hosting.
//!
//! Files are validated locally, then pushed to an [`ImageHost`]. Multi-file
//! uploads go through [`stage_uploads`], which either returns every image or
//! none: if one upload fails the ones that succeeded are destroyed again.
//! The caller then [`commit`](StagedUploads::commit)s the staged images once
//! its database write has succeeded, or [`discard`](StagedUploads::discard)s
//! them when it has not.

pub mod cloudinary;

use crate::types::{AppError, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;

pub use cloudinary::CloudinaryClient;

/// Per-file upload limit.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Products carry at most this many images per request.
pub const MAX_PRODUCT_IMAGES: usize = 5;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Remote folder an image is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Product,
    Category,
    Slider,
}

impl Folder {
    pub fn as_str(self) -> &'static str {
        match self {
            Folder::Product => "product",
            Folder::Category => "category",
            Folder::Slider => "slider",
        }
    }
}

/// An uploaded file as received in a multipart form.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Content type sent to the image host.
    pub fn mime(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => match self.content_type.as_deref() {
                Some("image/png") => "image/png",
                _ => "image/jpeg",
            },
        }
    }

    /// Checks size and format; runs before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Image '{}' is empty",
                self.file_name
            )));
        }

        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::InvalidInput(format!(
                "Image '{}' exceeds the 10MB limit",
                self.file_name
            )));
        }

        let allowed = match self.extension() {
            Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
            None => self
                .content_type
                .as_deref()
                .map(|ct| ALLOWED_CONTENT_TYPES.contains(&ct.to_ascii_lowercase().as_str()))
                .unwrap_or(false),
        };

        if !allowed {
            return Err(AppError::InvalidInput(
                "Only jpg, jpeg and png images are allowed".to_string(),
            ));
        }

        Ok(())
    }
}

/// An image stored on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Durable https URL
    pub url: String,
    /// Host-side identifier, used to destroy the image
    pub public_id: String,
}

/// Remote image storage.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores one image under `folder`.
    async fn upload(&self, file: &ImageFile, folder: Folder) -> Result<UploadedImage>;

    /// Removes a previously uploaded image.
    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Images uploaded for a pending write.
///
/// Dropping it without calling `commit` or `discard` destroys the images in
/// the background.
#[must_use = "staged uploads must be committed or discarded"]
pub struct StagedUploads {
    host: Arc<dyn ImageHost>,
    images: Vec<UploadedImage>,
    settled: bool,
}

impl StagedUploads {
    pub fn urls(&self) -> Vec<String> {
        self.images.iter().map(|image| image.url.clone()).collect()
    }

    /// URL of the first staged image; single-image forms use this.
    pub fn first_url(&self) -> Result<String> {
        self.images
            .first()
            .map(|image| image.url.clone())
            .ok_or_else(|| AppError::Internal("Upload produced no image".to_string()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Keeps the images; call once the referencing record is stored.
    pub fn commit(mut self) -> Vec<UploadedImage> {
        self.settled = true;
        std::mem::take(&mut self.images)
    }

    /// Destroys the images; call when the referencing record could not be stored.
    pub async fn discard(mut self) {
        self.settled = true;
        let images = std::mem::take(&mut self.images);
        destroy_all(self.host.as_ref(), &images).await;
    }

    /// Runs the write that references the staged images, then commits on
    /// success or discards on failure.
    pub async fn persist<T, F>(self, write: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match write.await {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(count = self.len(), error = %e, "write failed, discarding uploads");
                self.discard().await;
                Err(e)
            }
        }
    }
}

impl Drop for StagedUploads {
    fn drop(&mut self) {
        if self.settled || self.images.is_empty() {
            return;
        }

        let images = std::mem::take(&mut self.images);
        tracing::warn!(count = images.len(), "staged uploads dropped unsettled");

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let host = self.host.clone();
            handle.spawn(async move {
                destroy_all(host.as_ref(), &images).await;
            });
        }
    }
}

async fn destroy_all(host: &dyn ImageHost, images: &[UploadedImage]) {
    let results = join_all(images.iter().map(|image| host.destroy(&image.public_id))).await;

    for (image, result) in images.iter().zip(results) {
        if let Err(e) = result {
            tracing::warn!(public_id = %image.public_id, error = %e, "failed to destroy image");
        }
    }
}

/// Validates every file, then uploads them all concurrently.
///
/// Either every file is uploaded, or none remain on the host and the first
/// failure is returned.
pub async fn stage_uploads(
    host: &Arc<dyn ImageHost>,
    files: &[ImageFile],
    folder: Folder,
) -> Result<StagedUploads> {
    for file in files {
        file.validate()?;
    }

    let results = join_all(files.iter().map(|file| host.upload(file, folder))).await;

    let mut uploaded = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(image) => uploaded.push(image),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(err) = first_error {
        tracing::warn!(
            folder = folder.as_str(),
            uploaded = uploaded.len(),
            requested = files.len(),
            error = %err,
            "upload batch failed, rolling back"
        );
        destroy_all(host.as_ref(), &uploaded).await;
        return Err(err);
    }

    tracing::debug!(folder = folder.as_str(), count = uploaded.len(), "images staged");

    Ok(StagedUploads {
        host: host.clone(),
        images: uploaded,
        settled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn image(name: &str, size: usize) -> ImageFile {
        ImageFile::new(name, None, Bytes::from(vec![7u8; size]))
    }

    /// Uploads succeed unless the file name contains "fail".
    #[derive(Default)]
    struct RecordingHost {
        destroyed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, file: &ImageFile, folder: Folder) -> Result<UploadedImage> {
            if file.file_name.contains("fail") {
                return Err(AppError::Upstream("boom".to_string()));
            }
            let public_id = format!("{}/{}", folder.as_str(), file.file_name);
            Ok(UploadedImage {
                url: format!("https://img.test/{}", public_id),
                public_id,
            })
        }

        async fn destroy(&self, public_id: &str) -> Result<()> {
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_validation() {
        assert!(image("a.png", 10).validate().is_ok());
        assert!(image("a.JPG", 10).validate().is_ok());
        assert!(image("a.jpeg", MAX_IMAGE_BYTES).validate().is_ok());

        assert!(image("a.png", 0).validate().is_err());
        assert!(image("a.png", MAX_IMAGE_BYTES + 1).validate().is_err());
        assert!(image("a.gif", 10).validate().is_err());
        assert!(image("a.png.exe", 10).validate().is_err());
    }

    #[test]
    fn test_validation_falls_back_to_content_type() {
        let png = ImageFile::new("blob", Some("image/png".into()), Bytes::from_static(b"x"));
        assert!(png.validate().is_ok());
        assert_eq!(png.mime(), "image/png");

        let pdf = ImageFile::new("blob", Some("application/pdf".into()), Bytes::from_static(b"x"));
        assert!(pdf.validate().is_err());
    }

    #[tokio::test]
    async fn test_stage_all_or_nothing() {
        let recording = Arc::new(RecordingHost::default());
        let host: Arc<dyn ImageHost> = recording.clone();

        let files = vec![image("one.png", 4), image("fail.png", 4), image("three.png", 4)];
        let err = stage_uploads(&host, &files, Folder::Product).await.err();
        assert!(matches!(err, Some(AppError::Upstream(_))));

        let mut destroyed = recording.destroyed.lock().unwrap().clone();
        destroyed.sort();
        assert_eq!(destroyed, vec!["product/one.png", "product/three.png"]);
    }

    #[tokio::test]
    async fn test_invalid_file_uploads_nothing() {
        let recording = Arc::new(RecordingHost::default());
        let host: Arc<dyn ImageHost> = recording.clone();

        let files = vec![image("one.png", 4), image("two.gif", 4)];
        assert!(stage_uploads(&host, &files, Folder::Product).await.is_err());
        assert!(recording.destroyed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_and_discard() {
        let recording = Arc::new(RecordingHost::default());
        let host: Arc<dyn ImageHost> = recording.clone();

        let staged = stage_uploads(&host, &[image("a.png", 1)], Folder::Category)
            .await
            .unwrap();
        assert_eq!(staged.urls(), vec!["https://img.test/category/a.png"]);
        let kept = staged.commit();
        assert_eq!(kept.len(), 1);
        assert!(recording.destroyed.lock().unwrap().is_empty());

        let staged = stage_uploads(&host, &[image("b.png", 1)], Folder::Category)
            .await
            .unwrap();
        staged.discard().await;
        assert_eq!(
            recording.destroyed.lock().unwrap().as_slice(),
            ["category/b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_persist_discards_on_failed_write() {
        let recording = Arc::new(RecordingHost::default());
        let host: Arc<dyn ImageHost> = recording.clone();

        let staged = stage_uploads(&host, &[image("c.png", 1)], Folder::Slider)
            .await
            .unwrap();
        let result: Result<()> = staged
            .persist(async { Err(AppError::Database("disk full".to_string())) })
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(
            recording.destroyed.lock().unwrap().as_slice(),
            ["slider/c.png".to_string()]
        );

        let staged = stage_uploads(&host, &[image("d.png", 1)], Folder::Slider)
            .await
            .unwrap();
        let value = staged.persist(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(recording.destroyed.lock().unwrap().len(), 1);
    }
}
