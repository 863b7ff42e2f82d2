//! Domain bindings over the WS envelope.
//!
//! A facet groups the upstream actions of one resource. Its service domain
//! is fixed at definition time; requests only vary the parameters.

pub mod acl;
pub mod approvals;
pub mod contacts;
pub mod controls;
pub mod defects;
pub mod documents;
pub mod folders;
pub mod groups;
pub mod projects;
pub mod users;

use crate::mapping::{map_in, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{
    into_items, paginate, retain_matching, retain_searched, ListCapability, ListQuery, Page,
};
use crate::services::{AuthClient, UploadOrchestrator, WsClient};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A facet whose collection can be listed and paginated.
#[async_trait]
pub trait ListFacet: Send + Sync {
    /// Whether `list` pages upstream or returns the whole collection.
    fn capability(&self) -> ListCapability;

    /// Item table; also translates query-string filters.
    fn table(&self) -> &'static MappingTable;

    /// Raw upstream answer: `{total, items, LIMITSKIP, LIMITTAKE}` for native
    /// facets, the full list otherwise.
    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError>;
}

/// List any facet as a page of public DTOs.
pub async fn list_page<F>(facet: &F, session: &Authenticated, query: &ListQuery) -> Result<Page, ServiceError>
where
    F: ListFacet + ?Sized,
{
    let capability = facet.capability();
    let mut raw = facet.list(session, query).await?;
    if !capability.supports_pagination {
        let rows = retain_matching(into_items(raw)?, &query.filters);
        raw = Value::Array(retain_searched(rows, query.search.as_deref(), facet.table()));
    }
    paginate(capability, raw, query.page)?.map_items(facet.table())
}

pub struct Facets {
    pub users: users::UsersFacet,
    pub groups: groups::GroupsFacet,
    pub contacts: contacts::ContactsFacet,
    pub acl: acl::AclFacet,
    pub projects: projects::ProjectsFacet,
    pub folders: folders::FoldersFacet,
    pub documents: documents::DocumentsFacet,
    pub approvals: approvals::ApprovalsFacet,
    pub controls: controls::ControlsFacet,
    pub defects: defects::DefectsFacet,
    pub templates: defects::TemplatesFacet,
}

impl Facets {
    pub fn new(ws: Arc<WsClient>, auth: Arc<AuthClient>, uploads: Arc<UploadOrchestrator>) -> Self {
        Self {
            users: users::UsersFacet::new(ws.clone()),
            groups: groups::GroupsFacet::new(ws.clone()),
            contacts: contacts::ContactsFacet::new(ws.clone()),
            acl: acl::AclFacet::new(ws.clone()),
            projects: projects::ProjectsFacet::new(ws.clone(), auth),
            folders: folders::FoldersFacet::new(ws.clone()),
            documents: documents::DocumentsFacet::new(ws.clone(), uploads),
            approvals: approvals::ApprovalsFacet::new(ws.clone()),
            controls: controls::ControlsFacet::new(ws.clone()),
            defects: defects::DefectsFacet::new(ws.clone()),
            templates: defects::TemplatesFacet::new(ws),
        }
    }
}

/// Single `{key: value}` parameter object.
pub(crate) fn param(key: &str, value: impl Into<Value>) -> Value {
    let mut obj = Map::new();
    obj.insert(key.to_string(), value.into());
    Value::Object(obj)
}

/// Extract a list that upstream may wrap as `{<key>: [...]}`.
pub(crate) fn unwrap_list(raw: Value, key: &str) -> Result<Value, ServiceError> {
    match raw {
        Value::Object(mut obj) if obj.contains_key(key) => Ok(obj.remove(key).unwrap_or(Value::Null)),
        other => Ok(Value::Array(into_items(other)?)),
    }
}

/// Pick the row whose `upstream_key` equals `pk`, comparing textually since
/// upstream ids arrive as numbers or strings.
pub(crate) fn find_by_key(items: Vec<Value>, upstream_key: &str, pk: &str) -> Option<Value> {
    items.into_iter().find(|item| match item.get(upstream_key) {
        Some(Value::String(s)) => s == pk,
        Some(Value::Number(n)) => n.to_string() == pk,
        _ => false,
    })
}

/// First row of an answer that may be a single object, a list, or empty.
pub(crate) fn single(raw: Value, what: &str) -> Result<Value, ServiceError> {
    let row = match raw {
        Value::Object(ref obj) if obj.is_empty() => None,
        Value::Object(_) => Some(raw),
        Value::Array(items) => items.into_iter().next(),
        _ => None,
    };
    row.ok_or_else(|| ServiceError::NotFound(format!("{} not found", what)))
}

/// Creation answers are either the created row or just its id.
pub(crate) fn created(
    table: &'static MappingTable,
    id_field: &str,
    input: &Value,
    raw: Value,
) -> Result<Value, ServiceError> {
    match raw {
        Value::Object(_) => Ok(map_in(table, &raw)?),
        Value::Number(_) | Value::String(_) => {
            // Echo only what the table knows; unknown client keys are dropped.
            let mut echo: Map<String, Value> = input
                .as_object()
                .map(|obj| {
                    obj.iter()
                        .filter(|(key, _)| table.by_public(key).is_some())
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default();
            let id = raw
                .as_i64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()))
                .map(Value::from)
                .unwrap_or(raw);
            echo.insert(id_field.to_string(), id);
            Ok(Value::Object(echo))
        }
        Value::Bool(false) => Err(ServiceError::NotAccepted("creation refused upstream".to_string())),
        _ => Err(ServiceError::invalid_response()),
    }
}

/// Mutations acknowledged with a boolean: `false` is a refusal.
pub(crate) fn accepted(ok: bool, what: &str) -> Result<(), ServiceError> {
    if ok {
        Ok(())
    } else {
        Err(ServiceError::NotAccepted(format!("{} refused upstream", what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::tables::admin::GROUP;
    use serde_json::json;

    #[test]
    fn unwraps_keyed_lists() {
        assert_eq!(unwrap_list(json!({"groups": [1, 2]}), "groups").unwrap(), json!([1, 2]));
        assert_eq!(unwrap_list(json!([1]), "groups").unwrap(), json!([1]));
        assert!(unwrap_list(json!("x"), "groups").is_err());
    }

    #[test]
    fn finds_rows_by_textual_key() {
        let rows = vec![json!({"g_id": 1}), json!({"g_id": "2"})];
        assert_eq!(find_by_key(rows.clone(), "g_id", "2"), Some(json!({"g_id": "2"})));
        assert_eq!(find_by_key(rows.clone(), "g_id", "1"), Some(json!({"g_id": 1})));
        assert_eq!(find_by_key(rows, "g_id", "3"), None);
    }

    #[test]
    fn single_row_or_not_found() {
        assert_eq!(single(json!([{"a": 1}, {"a": 2}]), "x").unwrap(), json!({"a": 1}));
        assert!(matches!(single(json!([]), "x"), Err(ServiceError::NotFound(_))));
        assert!(matches!(single(json!({}), "x"), Err(ServiceError::NotFound(_))));
        assert!(matches!(single(Value::Null, "x"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn created_accepts_row_or_id() {
        let input = json!({"name": "Team"});

        let from_id = created(&GROUP, "id", &input, json!("12")).unwrap();
        assert_eq!(from_id, json!({"name": "Team", "id": 12}));

        let from_row = created(&GROUP, "id", &input, json!({"g_id": 12, "g_nom": "Team"})).unwrap();
        assert_eq!(from_row["id"], 12);
        assert_eq!(from_row["name"], "Team");

        let noisy = json!({"name": "Team", "colour": "red"});
        let echoed = created(&GROUP, "id", &noisy, json!(7)).unwrap();
        assert_eq!(echoed, json!({"name": "Team", "id": 7}));

        assert!(matches!(
            created(&GROUP, "id", &input, json!(false)),
            Err(ServiceError::NotAccepted(_))
        ));
    }
}
