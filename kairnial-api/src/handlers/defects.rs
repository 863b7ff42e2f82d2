use crate::dtos::ItemPath;
use crate::handlers::list;
use crate::middleware::context::Authenticated;
use crate::services::Page;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use service_core::error::AppError;
use std::collections::HashMap;

pub async fn list_defects(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.defects, &session, &params).await?))
}

pub async fn list_templates(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.templates, &session, &params).await?))
}

pub async fn template_elements(
    State(state): State<AppState>,
    session: Authenticated,
    Path(ItemPath { pk }): Path<ItemPath>,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.facets.templates.elements(&session, &pk).await?))
}

/// Emitters are served by the ACL manager under the defects scope.
pub async fn list_emitters(
    State(state): State<AppState>,
    session: Authenticated,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.facets.acl.emitters(&session).await?))
}
