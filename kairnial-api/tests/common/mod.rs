#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use kairnial_api::config::{
    ApiConfig, KairnialSettings, ObservabilitySettings, PaginationSettings, TestDefaults,
    UpstreamSettings,
};
use kairnial_api::startup::{build_app, build_state, AppState};
use serde_json::{json, Value};
use service_core::config::Config;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "acme";
pub const PROJECT_ID: &str = "proj1";
pub const USER_UUID: &str = "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10";

const PRIVATE_KEY: &str = include_str!("../fixtures/test_private_key.pem");
const PUBLIC_KEY: &str = include_str!("../fixtures/test_public_key.pem");

pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub state: AppState,
    pub auth: MockServer,
    pub ws: MockServer,
}

pub fn test_config(auth_uri: &str, ws_uri: &str) -> ApiConfig {
    ApiConfig {
        common: Config::default(),
        kairnial: KairnialSettings {
            auth_server: auth_uri.to_string(),
            auth_domain: None,
            auth_public_key: PUBLIC_KEY.to_string(),
            ws_server: ws_uri.to_string(),
            front_server: None,
            cross_server: None,
        },
        pagination: PaginationSettings {
            default_page_size: 100,
            max_page_size: 1000,
        },
        upstream: UpstreamSettings {
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        },
        observability: ObservabilitySettings::default(),
        defaults: TestDefaults::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let auth = MockServer::start().await;
        let ws = MockServer::start().await;

        let state = build_state(test_config(&auth.uri(), &ws.uri()))
            .expect("Failed to build application state");
        let app = build_app(state.clone());

        Self {
            app,
            state,
            auth,
            ws,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, body)
    }

    /// GET with a valid token for the test client.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(authorized(Request::get(uri), &valid_token()).body(Body::empty()).unwrap())
            .await
    }

    /// Number of requests the WS mock received for `domain.action`.
    pub async fn ws_calls(&self, qualified_action: &str) -> usize {
        self.ws
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().ends_with(qualified_action))
            .count()
    }
}

pub fn authorized(builder: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
    builder.header("Authentication", format!("Bearer {}", token))
}

pub fn mint_token(audience: &str, exp_offset_secs: i64) -> String {
    let claims = json!({
        "sub": USER_UUID,
        "aud": audience,
        "exp": (Utc::now() + ChronoDuration::seconds(exp_offset_secs)).timestamp(),
        "name": "Ada Lovelace",
        "email": "ada@example.com",
    });
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).expect("Invalid test key");
    encode(&Header::new(Algorithm::RS256), &claims, &key).expect("Failed to sign token")
}

pub fn valid_token() -> String {
    mint_token(CLIENT_ID, 3600)
}

/// `/<client>/<project>/<rest>`
pub fn project_uri(rest: &str) -> String {
    format!("/{}/{}/{}", CLIENT_ID, PROJECT_ID, rest.trim_start_matches('/'))
}

/// Regex matching the WS path of `domain.action` for the test user.
pub fn ws_path(qualified_action: &str) -> String {
    format!(r"^/user/{}/{}$", USER_UUID, regex_escape(qualified_action))
}

fn regex_escape(s: &str) -> String {
    s.replace('.', r"\.")
}
