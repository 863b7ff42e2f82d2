//! Projects are listed by the auth server and written through the WS
//! `projects` domain.

use crate::facets::{accepted, created, ListFacet};
use crate::mapping::tables::projects::PROJECT;
use crate::mapping::{map_in, map_out, map_out_partial, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{ListCapability, ListQuery};
use crate::services::{AuthClient, ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "projects";

pub struct ProjectsFacet {
    ws: Arc<WsClient>,
    auth: Arc<AuthClient>,
}

impl ProjectsFacet {
    pub fn new(ws: Arc<WsClient>, auth: Arc<AuthClient>) -> Self {
        Self { ws, auth }
    }

    pub async fn create(&self, session: &Authenticated, body: &Value) -> Result<Value, ServiceError> {
        let project = map_out(&PROJECT, body)?;
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "addProject")
                    .param(project)
                    .service_override(session.client_id.as_str()),
            )
            .await?;
        created(&PROJECT, "uuid", body, raw)
    }

    pub async fn update(&self, session: &Authenticated, pk: &str, body: &Value) -> Result<Value, ServiceError> {
        let changes = map_out_partial(&PROJECT, body)?;
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "updateProject")
                    .param(pk)
                    .param(changes)
                    .service_override(session.client_id.as_str()),
            )
            .await?;

        match raw {
            Value::Object(_) => Ok(map_in(&PROJECT, &raw)?),
            other => {
                let ok = other.as_bool().or_else(|| other.as_i64().map(|i| i != 0)).unwrap_or(false);
                accepted(ok, "updateProject")?;
                let mut echo = body.clone();
                if let Value::Object(obj) = &mut echo {
                    obj.insert("uuid".to_string(), Value::from(pk));
                }
                Ok(echo)
            }
        }
    }
}

#[async_trait]
impl ListFacet for ProjectsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::NATIVE
    }

    fn table(&self) -> &'static MappingTable {
        &PROJECT
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        self.auth.list_projects(session, query.paged_filter_object()).await
    }
}
