use crate::dtos::{ItemPath, JsonBody};
use crate::handlers::list;
use crate::middleware::context::Authenticated;
use crate::services::Page;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;
use std::collections::HashMap;

pub async fn list_projects(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.projects, &session, &params).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    session: Authenticated,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let project = state.facets.projects.create(&session, &body).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.projects.update(&session, &pk, &body).await?))
}
