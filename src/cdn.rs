//! Image hosting on a Cloudinary-style CDN.
//!
//! Handlers only see the [`ImageHost`] trait; a failed upload is logged by the
//! caller and the post is saved without touching its image.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CdnConfig;

#[derive(Debug, thiserror::Error)]
pub enum CdnError {
    #[error("image uploads are not configured")]
    NotConfigured,

    #[error("empty upload")]
    Empty,

    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDN returned an unusable URL: {0}")]
    BadUrl(#[from] url::ParseError),
}

/// A file pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload the image and return the public URL it is served from.
    async fn upload(&self, file: ImageFile) -> Result<url::Url, CdnError>;
}

/// Installed when no CDN credentials are configured.
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _file: ImageFile) -> Result<url::Url, CdnError> {
        Err(CdnError::NotConfigured)
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl CloudinaryClient {
    pub fn new(
        config: &CdnConfig,
        cloud_name: &str,
        api_key: &str,
        api_secret: &str,
    ) -> Result<Self, CdnError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/{}/image/upload",
                config.upload_base.trim_end_matches('/'),
                cloud_name
            ),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            folder: config.folder.clone().filter(|f| !f.is_empty()),
        })
    }

    fn signed_params(&self, timestamp: i64, public_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        if let Some(ref folder) = self.folder {
            params.push(("folder", folder.clone()));
        }
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }

    /// SHA-256 over `k1=v1&k2=v2...` (keys sorted) followed by the API secret.
    fn signature(&self, params: &[(&'static str, String)]) -> String {
        let joined = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, file: ImageFile) -> Result<url::Url, CdnError> {
        if file.data.is_empty() {
            return Err(CdnError::Empty);
        }

        let timestamp = chrono::Utc::now().timestamp();
        let public_id = uuid::Uuid::now_v7().to_string();
        let params = self.signed_params(timestamp, &public_id);
        let signature = self.signature(&params);

        let mut part = reqwest::multipart::Part::stream(file.data).file_name(file.file_name);
        if let Some(ref mime) = file.content_type {
            part = part.mime_str(mime)?;
        }

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response: UploadResponse = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = url::Url::parse(&response.secure_url)?;
        tracing::info!(%url, "Uploaded image");
        Ok(url)
    }
}

/// Picks the Cloudinary client when credentials are complete, otherwise the disabled host.
pub fn image_host(config: &CdnConfig) -> Result<Arc<dyn ImageHost>, CdnError> {
    match config.credentials() {
        Some((cloud_name, api_key, api_secret)) => {
            tracing::info!(cloud_name, "Image uploads go to the CDN");
            Ok(Arc::new(CloudinaryClient::new(
                config, cloud_name, api_key, api_secret,
            )?))
        }
        None => {
            tracing::warn!("CDN credentials missing; image uploads are disabled");
            Ok(Arc::new(DisabledImageHost))
        }
    }
}
