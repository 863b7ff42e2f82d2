use crate::dtos::{ItemPath, JsonBody};
use crate::middleware::context::Authenticated;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

pub async fn get_contact(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.contacts.retrieve(&session, &pk).await?))
}

pub async fn create_contact(
    State(state): State<AppState>,
    session: Authenticated,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let contact = state.facets.contacts.create(&session, &body).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}
