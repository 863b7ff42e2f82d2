//! Multipart body of a document upload.

use crate::services::UploadRequest;
use axum::extract::Multipart;
use serde_json::{Map, Value};
use service_core::error::AppError;

/// Text parts copied into the document metadata under their public name.
const METADATA_FIELDS: &[&str] = &[
    "folder_id",
    "title",
    "description",
    "revision",
    "rfield",
    "linked_objects",
    "visas",
];

#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub last_modified: Option<i64>,
    pub metadata: Map<String, Value>,
}

impl UploadForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file bytes: {}", e))
                    })?;
                    form.bytes = Some(bytes.to_vec());
                }
                "last_modified" => {
                    let text = field_text(field).await?;
                    let ms = text.trim().parse::<i64>().map_err(|_| {
                        AppError::BadRequest("last_modified must be milliseconds since the epoch".to_string())
                    })?;
                    form.last_modified = Some(ms);
                }
                other if METADATA_FIELDS.contains(&other) => {
                    let text = field_text(field).await?;
                    form.metadata.insert(name, Value::String(text));
                }
                _ => tracing::debug!(field = %name, "Ignoring unknown multipart field"),
            }
        }

        Ok(form)
    }

    /// Require the file part and fill in the transfer defaults.
    pub fn into_request(self, now_ms: i64) -> Result<UploadRequest, AppError> {
        let bytes = self
            .bytes
            .ok_or_else(|| AppError::BadRequest("file is required".to_string()))?;
        if !self.metadata.contains_key("folder_id") {
            return Err(AppError::BadRequest("folder_id is required".to_string()));
        }

        Ok(UploadRequest {
            file_name: self
                .file_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "unnamed".to_string()),
            content_type: self
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes,
            last_modified: self.last_modified.unwrap_or(now_ms),
            metadata: Value::Object(self.metadata),
        })
    }
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", name, e)))
}
