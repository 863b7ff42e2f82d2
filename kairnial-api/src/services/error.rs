use crate::mapping::{Direction, MappingError};
use crate::services::token::VerifyError;
use service_core::error::AppError;
use thiserror::Error;

/// Synthetic status for transport failures towards upstream hosts.
pub const TRANSPORT_FAILURE_STATUS: i64 = 502;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Upstream WS failure: HTTP status, embedded `errorCode`, or a
    /// synthetic status (0 = undecodable body, 502 = transport).
    #[error("WS service error {status}: {message}")]
    WsService { status: i64, message: String },

    /// Auth server rejected a credential exchange.
    #[error("Authentication error {status}: {message}")]
    Authentication { status: u16, message: String },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] VerifyError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream answered `false` to a mutation.
    #[error("Not accepted: {0}")]
    NotAccepted(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    pub fn ws(status: i64, message: impl Into<String>) -> Self {
        ServiceError::WsService {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response() -> Self {
        ServiceError::ws(0, "invalid response")
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::WsService { status, message } => AppError::Upstream {
                code: status,
                description: message,
            },
            ServiceError::Authentication { status, message } => AppError::Unauthorized {
                code: i64::from(status),
                description: message,
            },
            ServiceError::Unauthenticated(e) => AppError::unauthorized(e.reason()),
            ServiceError::Mapping(e) => match e.direction {
                // The client sent something the table cannot encode.
                Direction::Outbound => AppError::BadRequest(e.to_string()),
                // Upstream sent something we cannot decode: our bug or theirs.
                Direction::Inbound => AppError::MappingError(e.to_string()),
            },
            ServiceError::NotFound(e) => AppError::NotFound(e),
            ServiceError::NotAccepted(e) => AppError::NotAccepted(e),
            ServiceError::InvalidRequest(e) => AppError::BadRequest(e),
        }
    }
}
