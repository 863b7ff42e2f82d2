use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error envelope shared by every façade endpoint.
///
/// `status` repeats the HTTP status, `code` carries the upstream error code
/// (or 0 when the failure did not originate upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: i64,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {description}")]
    Unauthorized { code: i64, description: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Not accepted: {0}")]
    NotAccepted(String),

    #[error("Upstream error {code}: {description}")]
    Upstream { code: i64, description: String },

    #[error("Mapping error: {0}")]
    MappingError(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// 401 without an upstream code, used for token and header failures.
    pub fn unauthorized(description: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code: 0,
            description: description.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::Upstream { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::NotAccepted(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::MappingError(_) | AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render the envelope without consuming the error.
    pub fn to_body(&self) -> ErrorBody {
        let status = self.status().as_u16();

        let (code, description) = match self {
            AppError::ValidationError(err) => (0, err.to_string()),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::NotAccepted(msg) => (0, msg.clone()),
            AppError::Unauthorized { code, description }
            | AppError::Upstream { code, description } => (*code, description.clone()),
            AppError::MappingError(msg) => (0, msg.clone()),
            // Internal details stay in the logs.
            AppError::InternalError(_) => (0, "Internal server error".to_string()),
            AppError::ConfigError(_) => (0, "Configuration error".to_string()),
        };

        ErrorBody {
            status,
            code,
            description,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_render_as_bad_request_with_code() {
        let err = AppError::Upstream {
            code: 17,
            description: "dup".to_string(),
        };

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_body(),
            ErrorBody {
                status: 400,
                code: 17,
                description: "dup".to_string(),
            }
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalError(anyhow::anyhow!("connection pool exhausted"));
        let body = err.to_body();

        assert_eq!(body.status, 500);
        assert_eq!(body.code, 0);
        assert_eq!(body.description, "Internal server error");
    }

    #[test]
    fn status_table() {
        assert_eq!(
            AppError::unauthorized("token-expired").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MethodNotAllowed("x".into()).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::NotAccepted("x".into()).status(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            AppError::MappingError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
