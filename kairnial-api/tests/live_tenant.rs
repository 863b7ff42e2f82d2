use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kairnial_api::config::ApiConfig;
use kairnial_api::startup::{build_app, build_state};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tower::ServiceExt;

/// API-key login and a folder listing against the tenant named by the
/// `DEFAULT_KAIRNIAL_*` variables.
#[tokio::test]
#[ignore = "Requires KAIRNIAL_* and DEFAULT_KAIRNIAL_* pointing at a real tenant"]
async fn api_key_login_and_folder_listing() {
    dotenvy::dotenv().ok();
    let config = ApiConfig::load().expect("Failed to load configuration");
    let defaults = config.defaults.clone();

    let client_id = defaults.client_id.expect("DEFAULT_KAIRNIAL_CLIENT_ID not set");
    let project_id = defaults.project_id.expect("DEFAULT_KAIRNIAL_PROJECT_ID not set");
    let api_key = defaults.api_key.expect("DEFAULT_KAIRNIAL_API_KEY not set");
    let api_secret = defaults.api_secret.expect("DEFAULT_KAIRNIAL_API_SECRET not set");

    let app = build_app(build_state(config).expect("Failed to build application state"));

    let login = Request::post(format!("/{}/authentication/key", client_id))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"api_key": api_key, "api_secret": api_secret.expose_secret()}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let token = body["access_token"].as_str().expect("no access_token").to_string();

    let folders = Request::get(format!("/{}/{}/dms/folders?page_limit=1", client_id, project_id))
        .header("Authentication", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(folders).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
