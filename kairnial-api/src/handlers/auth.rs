use crate::dtos::{check_client_id, ApiKeyLoginRequest, JsonBody, PasswordLoginRequest};
use crate::services::{AuthResult, Grant};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use service_core::error::AppError;
use service_core::observability::extract_request_id;
use validator::Validate;

pub async fn password_login(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<PasswordLoginRequest>,
) -> Result<Json<AuthResult>, AppError> {
    body.validate()?;
    check_client_id(&client_id, body.client_id.as_deref())?;

    exchange(&state, &client_id, &headers, body.into()).await
}

pub async fn api_key_login(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<ApiKeyLoginRequest>,
) -> Result<Json<AuthResult>, AppError> {
    body.validate()?;
    check_client_id(&client_id, body.client_id.as_deref())?;

    exchange(&state, &client_id, &headers, body.into()).await
}

async fn exchange(
    state: &AppState,
    client_id: &str,
    headers: &HeaderMap,
    grant: Grant,
) -> Result<Json<AuthResult>, AppError> {
    let request_id = extract_request_id(headers);
    let result = state
        .auth
        .login(client_id, &grant, request_id.as_deref())
        .await?;
    Ok(Json(result))
}
