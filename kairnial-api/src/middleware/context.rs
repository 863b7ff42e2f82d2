//! Per-request context assembled from path segments and headers.
//!
//! Clients send their bearer token in an `Authentication` header (not
//! `Authorization`). The token is verified against the `client_id` path
//! segment, which is the expected audience.

use crate::services::error::ServiceError;
use crate::services::token::{Principal, VerifyError};
use crate::startup::AppState;
use axum::async_trait;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use service_core::error::AppError;
use service_core::observability::extract_request_id;

pub const AUTHENTICATION_HEADER: &str = "Authentication";

/// Everything the façade knows about the caller.
///
/// Always extractable; `principal` is `None` when the token is absent or
/// fails verification, with the reason kept in `auth_error`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub principal: Option<Principal>,
    pub auth_error: Option<VerifyError>,
    pub request_id: Option<String>,
    pub headers: HeaderMap,
    token: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut client_id = None;
        let mut project_id = None;
        if let Ok(params) = RawPathParams::from_request_parts(parts, state).await {
            for (key, value) in params.iter() {
                match key {
                    "client_id" => client_id = Some(value.to_string()),
                    "project_id" => project_id = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        let header = parts
            .headers
            .get(AUTHENTICATION_HEADER)
            .and_then(|v| v.to_str().ok());

        let (principal, token, auth_error) =
            match state.verifier.verify_header(header, client_id.as_deref()) {
                Ok((token, principal)) => (Some(principal), Some(token), None),
                Err(e) => (None, None, Some(e)),
            };

        if let Some(p) = &principal {
            tracing::Span::current().record("user_id", p.uuid.as_str());
        }

        Ok(RequestContext {
            client_id,
            project_id,
            principal,
            auth_error,
            request_id: extract_request_id(&parts.headers),
            headers: parts.headers.clone(),
            token,
        })
    }
}

/// A context whose token verified. Facet handlers require this.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub client_id: String,
    pub project_id: Option<String>,
    pub principal: Principal,
    pub request_id: Option<String>,
    pub headers: HeaderMap,
    token: String,
}

impl Authenticated {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_uuid(&self) -> &str {
        &self.principal.uuid
    }

    /// Project scope for WS calls (`service` in the envelope).
    pub fn project(&self) -> Result<&str, ServiceError> {
        self.project_id
            .as_deref()
            .ok_or_else(|| ServiceError::InvalidRequest("missing project_id".to_string()))
    }
}

impl TryFrom<RequestContext> for Authenticated {
    type Error = VerifyError;

    fn try_from(ctx: RequestContext) -> Result<Self, Self::Error> {
        match (ctx.principal, ctx.token, ctx.client_id) {
            (Some(principal), Some(token), Some(client_id)) => Ok(Authenticated {
                client_id,
                project_id: ctx.project_id,
                principal,
                request_id: ctx.request_id,
                headers: ctx.headers,
                token,
            }),
            _ => Err(ctx.auth_error.unwrap_or(VerifyError::Missing)),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state).await?;
        Authenticated::try_from(ctx).map_err(|e| AppError::from(ServiceError::Unauthenticated(e)))
    }
}

#[cfg(test)]
impl Authenticated {
    /// Session for unit tests that talk to mocked upstreams.
    pub fn for_tests(project_id: Option<&str>) -> Self {
        Authenticated {
            client_id: "acme".to_string(),
            project_id: project_id.map(str::to_string),
            principal: Principal {
                uuid: "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            request_id: Some("req-1".to_string()),
            headers: HeaderMap::new(),
            token: "test-token".to_string(),
        }
    }
}
