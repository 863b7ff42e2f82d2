//! Folders, documents and approval circuits.

use crate::dtos::{ItemPath, JsonBody, UploadForm};
use crate::handlers::list;
use crate::middleware::context::Authenticated;
use crate::services::Page;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;
use std::collections::HashMap;

pub async fn list_folders(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.folders, &session, &params).await?))
}

pub async fn get_folder(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.folders.retrieve(&session, &pk).await?))
}

pub async fn create_folder(
    State(state): State<AppState>,
    session: Authenticated,
    JsonBody(body): JsonBody<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let folder = state.facets.folders.create(&session, &body).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn update_folder(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.folders.update(&session, &pk, &body).await?))
}

pub async fn delete_folder(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    state.facets.folders.destroy(&session, &pk).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_documents(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.documents, &session, &params).await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.facets.documents.retrieve(&session, &pk).await?))
}

pub async fn upload_document(
    State(state): State<AppState>,
    session: Authenticated,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let form = UploadForm::read(&mut multipart).await?;
    let request = form.into_request(chrono::Utc::now().timestamp_millis())?;

    tracing::info!(
        file_name = %request.file_name,
        size = request.bytes.len(),
        "Document upload started"
    );

    let document = state.facets.documents.create(&session, request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    state.facets.documents.destroy(&session, &pk).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_approvals(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.approvals, &session, &params).await?))
}

pub async fn delete_approval(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    state.facets.approvals.destroy(&session, &pk).await?;
    Ok(StatusCode::NO_CONTENT)
}
