use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::{service_error_message, QuizError, Result};
use crate::models::StoredObject;

/// Media kind declared alongside an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Pdf,
}

impl UploadKind {
    pub fn mime(&self) -> &'static str {
        match self {
            UploadKind::Video => "video/mp4",
            UploadKind::Pdf => "application/pdf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Pdf => "pdf",
        }
    }
}

/// File-upload collaborator used by VIDEO/PDF lesson bodies. Deletion is
/// best-effort at the call sites: a failed delete of a superseded file must
/// never block the surrounding save.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, name: &str, bytes: Vec<u8>, kind: UploadKind) -> Result<StoredObject>;
    async fn delete(&self, file_id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpFileStore {
    client: Client,
    base_url: String,
}

impl HttpFileStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>, kind: UploadKind) -> Result<StoredObject> {
        info!(file_name = name, kind = kind.as_str(), size = bytes.len(), "Uploading file");

        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(kind.mime())
            .map_err(|e| QuizError::Validation(format!("Invalid media type: {}", e)))?;
        let form = Form::new()
            .text("declaredType", kind.as_str())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = service_error_message(status, &body);
            error!(status = %status, error = %message, "File upload failed");
            return Err(QuizError::Network(message));
        }

        let stored: StoredObject = response.json().await?;
        info!(file_id = %stored.id, url = %stored.file_url, "File uploaded");
        Ok(stored)
    }

    async fn delete(&self, file_id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/files/{}", self.base_url, file_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::Network(service_error_message(status, &body)));
        }
        Ok(())
    }
}
