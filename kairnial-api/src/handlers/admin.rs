//! Users, groups and ACL lookups of a project.

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

pub async fn list_users(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.users, &session, &params).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.users.retrieve(&session, &pk).await?))
}

pub async fn list_groups(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.groups, &session, &params).await?))
}

pub async fn get_group(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.groups.retrieve(&session, &pk).await?))
}

pub async fn create_group(
    State(state): State<AppState>,
    session: Authenticated,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let group = state.facets.groups.create(&session, &body).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn group_members(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.facets.groups.members(&session, &pk).await?))
}

pub async fn add_group_member(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
    JsonBody(body): JsonBody<Value>,
) -> Result<StatusCode, AppError> {
    state.facets.groups.add_member(&session, &pk, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_group_member(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
    JsonBody(body): JsonBody<Value>,
) -> Result<StatusCode, AppError> {
    state.facets.groups.remove_member(&session, &pk, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_modules(
    State(state): State<AppState>,
    session: Authenticated,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.facets.acl.modules(&session).await?))
}

pub async fn list_acl_grants(
    State(state): State<AppState>,
    session: Authenticated,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.facets.acl.grants(&session).await?))
}
