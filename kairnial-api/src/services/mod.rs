pub mod auth_client;
pub mod cache;
pub mod error;
pub mod metrics;
pub mod pagination;
pub mod token;
pub mod upload;
pub mod ws_client;

pub use auth_client::{AuthClient, AuthResult, Grant};
pub use cache::WsCache;
pub use error::ServiceError;
pub use pagination::{ListCapability, ListQuery, Page, PageRequest};
pub use token::{Principal, TokenVerifier, VerifyError};
pub use upload::{LogOrphanedSlot, UploadCompensation, UploadOrchestrator, UploadRequest};
pub use ws_client::{ResultFormat, ServiceCall, WsClient};
