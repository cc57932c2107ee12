//! Cloudinary upload API client.
//!
//! Requests are signed: the parameters other than `file`, `api_key` and the
//! signature itself are sorted by name, joined as `k=v&k=v`, suffixed with the
//! API secret and hashed with SHA-256.

use super::{Folder, ImageFile, ImageHost, UploadedImage};
use crate::types::{AppError, Result};
use crate::utils::config::CloudinaryConfig;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct CloudinaryClient {
    http: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("storefront-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{}", self.api_base, self.cloud_name, action)
    }

    /// Hex SHA-256 over the sorted parameters followed by the secret.
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Adds `api_key`, `signature` and `signature_algorithm` to `params`.
    fn signed(&self, params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = self.sign(&params);
        let mut signed = params;
        signed.push(("api_key", self.api_key.clone()));
        signed.push(("signature", signature));
        signed.push(("signature_algorithm", "sha256".to_string()));
        signed
    }

    async fn upstream_error(action: &str, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or(body);

        AppError::Upstream(format!("Cloudinary {} failed ({}): {}", action, status, message))
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, file: &ImageFile, folder: Folder) -> Result<UploadedImage> {
        let params = self.signed(vec![
            ("folder", folder.as_str().to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);

        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(file.mime())
            .map_err(|e| AppError::Internal(format!("Invalid content type: {}", e)))?;

        let form = params
            .into_iter()
            .fold(multipart::Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cloudinary upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::upstream_error("upload", response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Cloudinary response: {}", e)))?;

        tracing::info!(public_id = %uploaded.public_id, folder = folder.as_str(), "image uploaded");

        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        let params = self.signed(vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Cloudinary destroy failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::upstream_error("destroy", response).await);
        }

        let outcome: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Cloudinary response: {}", e)))?;

        // "not found" means there is nothing left to remove
        match outcome.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AppError::Upstream(format!(
                "Cloudinary destroy returned '{}'",
                other
            ))),
        }
    }
}
