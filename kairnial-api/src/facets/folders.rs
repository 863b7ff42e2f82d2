use crate::facets::{accepted, created, find_by_key, param, ListFacet};
use crate::mapping::tables::dms::FOLDER;
use crate::mapping::{map_in, map_out, map_out_partial, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{into_items, ListCapability, ListQuery};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "fichiers";

pub struct FoldersFacet {
    ws: Arc<WsClient>,
}

impl FoldersFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn retrieve(&self, session: &Authenticated, pk: &str) -> Result<Value, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getFlexDossiers").param(param("fcat_id", pk)),
            )
            .await?;

        let rows = match raw {
            Value::Object(mut obj) if obj.contains_key("items") => {
                into_items(obj.remove("items").unwrap_or(Value::Null))?
            }
            other => into_items(other)?,
        };
        let row = find_by_key(rows, "fcat_id", pk)
            .ok_or_else(|| ServiceError::NotFound(format!("folder {} not found", pk)))?;
        Ok(map_in(&FOLDER, &row)?)
    }

    pub async fn create(&self, session: &Authenticated, body: &Value) -> Result<Value, ServiceError> {
        let folder = map_out(&FOLDER, body)?;
        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "addDossier").param(folder))
            .await?;
        created(&FOLDER, "id", body, raw)
    }

    /// Apply the present fields, then answer with the stored folder.
    pub async fn update(&self, session: &Authenticated, pk: &str, body: &Value) -> Result<Value, ServiceError> {
        let mut changes = map_out_partial(&FOLDER, body)?;
        if let Value::Object(obj) = &mut changes {
            obj.insert("fcat_id".to_string(), Value::from(pk));
        }

        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "updateDossier").param(changes))
            .await?;

        match raw {
            Value::Object(_) => Ok(map_in(&FOLDER, &raw)?),
            other => {
                let ok = other.as_bool().or_else(|| other.as_i64().map(|i| i != 0)).unwrap_or(false);
                accepted(ok, "updateDossier")?;
                self.retrieve(session, pk).await
            }
        }
    }

    pub async fn destroy(&self, session: &Authenticated, pk: &str) -> Result<(), ServiceError> {
        let ok = self
            .ws
            .call_bool(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "archiveIt").param(param("fcat_id", pk)),
            )
            .await?;
        accepted(ok, "archiveIt")
    }
}

#[async_trait]
impl ListFacet for FoldersFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::NATIVE
    }

    fn table(&self) -> &'static MappingTable {
        &FOLDER
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        self.ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getFlexDossiers").param(query.paged_filter_object()),
            )
            .await
    }
}
