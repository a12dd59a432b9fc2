// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attachment object storage.
//!
//! Uploads go to Cloudinary's signed upload API in production. The
//! [`AttachmentStore`] trait lets tests and unconfigured deployments swap
//! the backend.

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use crate::models::AttachmentKind;
use async_trait::async_trait;
use axum::body::Bytes;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// A file on its way to the object store.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub file_name: String,
    pub media_type: String,
    pub kind: AttachmentKind,
    pub folder: String,
}

/// Where the store put the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// Backend that accepts uploaded attachments.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Upload a file, returning once the store has acknowledged it.
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, AppError>;
}

// ─── Cloudinary ──────────────────────────────────────────────

/// Cloudinary signed-upload client.
#[derive(Clone)]
pub struct CloudinaryStore {
    http: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryErrorBody,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            config,
            base_url: "https://api.cloudinary.com/v1_1".to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", self.base_url, self.config.cloud_name)
    }
}

/// Cloudinary request signature: SHA-1 over the alphabetically sorted
/// `key=value` pairs joined with `&`, followed by the API secret.
pub fn cloudinary_signature(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AttachmentStore for CloudinaryStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, AppError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs();

        let mut signed: Vec<(&str, String)> = vec![
            ("folder", request.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ];
        if request.kind == AttachmentKind::Pdf {
            signed.push(("format", "pdf".to_string()));
        }
        let signature = cloudinary_signature(&signed, &self.config.api_secret);

        let size = request.data.len();
        let file_part = reqwest::multipart::Part::stream(request.data)
            .file_name(request.file_name.clone())
            .mime_str(&request.media_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid media type: {}", e)))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in signed {
            form = form.text(key, value);
        }

        tracing::debug!(
            file_name = %request.file_name,
            size,
            folder = %request.folder,
            "Uploading attachment to Cloudinary"
        );

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ObjectStore(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CloudinaryErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::ObjectStore(format!("HTTP {}: {}", status, message)));
        }

        let uploaded: CloudinaryUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ObjectStore(format!("JSON parse error: {}", e)))?;

        Ok(StoredObject {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

// ─── Fallbacks ───────────────────────────────────────────────

/// Used when no object store credentials are configured.
pub struct DisabledStore;

#[async_trait]
impl AttachmentStore for DisabledStore {
    async fn upload(&self, _request: UploadRequest) -> Result<StoredObject, AppError> {
        Err(AppError::ObjectStore(
            "Object store is not configured".to_string(),
        ))
    }
}

/// Keeps uploads in memory. For tests and local runs.
#[derive(Default)]
pub struct MemoryAttachmentStore {
    uploads: Mutex<Vec<UploadRequest>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything uploaded so far.
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, AppError> {
        let public_id = format!("{}/{}", request.folder, uuid::Uuid::new_v4());
        let url = format!("memory://{}", public_id);

        self.uploads
            .lock()
            .map_err(|_| AppError::ObjectStore("Upload store poisoned".to_string()))?
            .push(request);

        Ok(StoredObject { url, public_id })
    }
}
