//! Client for the Kairnial auth server: credential exchange and project
//! listing.

use crate::mapping::{map_in, tables::auth::AUTH_USER};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::ws_client::{decode_response, transport_error};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::{json, Map, Value};
use service_core::observability::TracedClientExt;
use std::time::Duration;

const LOGIN_PATH: &str = "/api/oauth2/login";
const PROJECTS_PATH: &str = "/api/v2/projects";

pub const PASSWORD_SCOPE: &str = "login-token project-list";
pub const API_KEY_SCOPE: &str = "direct-login project-list";

/// Credentials for one of the two supported grant flows.
pub enum Grant {
    Password {
        username: String,
        password: Secret<String>,
    },
    ApiKey {
        api_key: String,
        api_secret: Secret<String>,
    },
}

impl Grant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::Password { .. } => "password",
            Grant::ApiKey { .. } => "api_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResult {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    pub user: Value,
}

pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build auth HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange credentials for an access token.
    ///
    /// The password grant is form-encoded, the API-key grant is JSON.
    pub async fn login(
        &self,
        client_id: &str,
        grant: &Grant,
        request_id: Option<&str>,
    ) -> Result<AuthResult, ServiceError> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let request = self.client.traced_post(&url).request_id(request_id);

        let request = match grant {
            Grant::Password { username, password } => request.form(&[
                ("client_id", client_id),
                ("grant_type", grant.grant_type()),
                ("username", username.as_str()),
                ("password", password.expose_secret().as_str()),
                ("scope", PASSWORD_SCOPE),
            ]),
            Grant::ApiKey {
                api_key,
                api_secret,
            } => request.json(&json!({
                "client_id": client_id,
                "grant_type": grant.grant_type(),
                "api_key": api_key,
                "api_secret": api_secret.expose_secret(),
                "scope": API_KEY_SCOPE,
            })),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::warn!(
                client_id,
                grant_type = grant.grant_type(),
                status = status.as_u16(),
                "Credential exchange rejected"
            );
            return Err(ServiceError::Authentication {
                status: status.as_u16(),
                message: text,
            });
        }

        let result = parse_token_response(&text)?;
        tracing::info!(
            client_id,
            grant_type = grant.grant_type(),
            expires_in = result.expires_in,
            "Credential exchange succeeded"
        );
        Ok(result)
    }

    /// List the caller's projects; upstream paginates natively.
    pub async fn list_projects(
        &self,
        session: &Authenticated,
        filter: Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let url = format!("{}{}", self.base_url, PROJECTS_PATH);

        let mut body = filter;
        body.insert("client_id".to_string(), Value::from(session.client_id.as_str()));
        body.insert("onlyUUID".to_string(), Value::Bool(false));

        let response = self
            .client
            .traced_post(&url)
            .bearer_auth(session.token())
            .json(&body)
            .request_id(session.request_id.as_deref())
            .send()
            .await
            .map_err(transport_error)?;

        decode_response(response).await
    }
}

fn invalid_auth_response() -> ServiceError {
    ServiceError::Authentication {
        status: 400,
        message: "invalid response".to_string(),
    }
}

fn parse_token_response(text: &str) -> Result<AuthResult, ServiceError> {
    let body: Value = serde_json::from_str(text).map_err(|_| invalid_auth_response())?;

    let access_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(invalid_auth_response)?
        .to_string();

    let expires_in = match body.get("expires_in") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };

    let user = match body.get("user") {
        Some(user) if user.is_object() => map_in(&AUTH_USER, user)?,
        _ => Value::Null,
    };

    Ok(AuthResult {
        access_token,
        token_type: body
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("Bearer")
            .to_string(),
        expires_in,
        scope: body
            .get("scope")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        user,
    })
}
