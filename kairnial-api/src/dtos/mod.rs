pub mod auth;
pub mod documents;

pub use auth::{check_client_id, ApiKeyLoginRequest, PasswordLoginRequest};
pub use documents::UploadForm;

use axum::extract::FromRequest;
use serde::Deserialize;
use service_core::error::AppError;

/// JSON body whose rejections render as the standard error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `{pk}` segment of item routes; the client and project segments are read
/// by the request context.
#[derive(Debug, Deserialize)]
pub struct ItemPath {
    pub pk: String,
}
