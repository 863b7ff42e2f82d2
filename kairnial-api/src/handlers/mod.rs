pub mod admin;
pub mod auth;
pub mod contacts;
pub mod controls;
pub mod defects;
pub mod dms;
pub mod health;
pub mod projects;

pub use health::{health_check, metrics_endpoint};

use crate::facets::{list_page, ListFacet};
use crate::middleware::context::Authenticated;
use crate::services::{ListQuery, Page};
use crate::startup::AppState;
use axum::http::{Method, Uri};
use service_core::error::AppError;
use std::collections::HashMap;

pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{} not allowed on {}", method, uri.path()))
}

/// Parse the query string against the facet's table and return one page.
pub(crate) async fn list<F>(
    state: &AppState,
    facet: &F,
    session: &Authenticated,
    params: &HashMap<String, String>,
) -> Result<Page, AppError>
where
    F: ListFacet + ?Sized,
{
    let query = ListQuery::parse(params, facet.table(), &state.config.pagination)?;
    Ok(list_page(facet, session, &query).await?)
}
