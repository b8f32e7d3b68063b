use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, StoredObject};
use crate::models::FileUpload;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, ObjectStoreError> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ObjectStoreError::ConfigMissing(name))
        };
        Ok(Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME")?,
            api_key: var("CLOUDINARY_API_KEY")?,
            api_secret: var("CLOUDINARY_API_SECRET")?,
            api_base: std::env::var("CLOUDINARY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
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
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary image storage using signed uploads
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// SHA-256 signature over the alphabetically sorted parameters
    fn sign(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    async fn read_error(response: reqwest::Response) -> ObjectStoreError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => "no error details".to_string(),
        };
        ObjectStoreError::Rejected { status, message }
    }
}

fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn put(&self, namespace: &str, file: &FileUpload) -> Result<StoredObject, ObjectStoreError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", namespace), ("timestamp", &timestamp)]);

        let mime = file.content_type.as_deref().unwrap_or("application/octet-stream");
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(mime)?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", namespace.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self.client.post(self.endpoint("upload")).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let body: UploadResponse = response.json().await?;
        debug!(public_id = %body.public_id, "uploaded image");
        Ok(StoredObject {
            url: body.secure_url,
            key: body.public_id,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", key), ("timestamp", &timestamp)]);
        let params = [
            ("public_id", key),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self.client.post(self.endpoint("destroy")).form(&params).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(ObjectStoreError::InvalidResponse(format!("destroy returned '{}'", other))),
        }
    }
}
