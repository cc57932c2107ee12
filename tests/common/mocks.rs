//! Test doubles shared by the integration tests.

use async_trait::async_trait;
use std::sync::Mutex;
use storefront::media::{Folder, ImageFile, ImageHost, UploadedImage};
use storefront::types::{AppError, Result};

/// In-memory image host.
///
/// Uploads succeed and are recorded, except for files whose name contains the
/// configured failure marker. Destroyed ids are recorded too.
#[derive(Default)]
pub struct FakeImageHost {
    fail_marker: Mutex<Option<String>>,
    uploaded: Mutex<Vec<UploadedImage>>,
    destroyed: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads of files whose name contains `marker` fail.
    pub fn fail_when_named(&self, marker: &str) {
        *self.fail_marker.lock().unwrap() = Some(marker.to_string());
    }

    pub fn uploaded(&self) -> Vec<UploadedImage> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }

    /// Images uploaded and not destroyed since.
    pub fn live(&self) -> Vec<UploadedImage> {
        let destroyed = self.destroyed();
        self.uploaded()
            .into_iter()
            .filter(|image| !destroyed.contains(&image.public_id))
            .collect()
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, file: &ImageFile, folder: Folder) -> Result<UploadedImage> {
        let should_fail = self
            .fail_marker
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|marker| file.file_name.contains(marker));

        if should_fail {
            return Err(AppError::Upstream(format!(
                "simulated failure for {}",
                file.file_name
            )));
        }

        let mut uploaded = self.uploaded.lock().unwrap();
        let public_id = format!("{}/{}-{}", folder.as_str(), uploaded.len(), file.file_name);
        let image = UploadedImage {
            url: format!("https://images.test/{}", public_id),
            public_id,
        };
        uploaded.push(image.clone());
        Ok(image)
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}
