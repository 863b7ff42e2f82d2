use crate::handlers::list;
use crate::middleware::context::Authenticated;
use crate::services::Page;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

pub async fn list_control_folders(
    State(state): State<AppState>,
    session: Authenticated,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(list(&state, &state.facets.controls, &session, &params).await?))
}
