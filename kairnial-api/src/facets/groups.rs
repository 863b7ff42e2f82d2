use crate::facets::{accepted, created, find_by_key, param, unwrap_list, ListFacet};
use crate::mapping::tables::admin::{GROUP, GROUP_MEMBER, GROUP_MEMBERSHIP};
use crate::mapping::{map_in, map_in_list, map_out, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{into_items, ListCapability, ListQuery};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "users";

pub struct GroupsFacet {
    ws: Arc<WsClient>,
}

impl GroupsFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    async fn all(&self, session: &Authenticated, filter: Map<String, Value>) -> Result<Value, ServiceError> {
        let mut call = ServiceCall::new(SERVICE_DOMAIN, "getGroups").cached();
        if !filter.is_empty() {
            call = call.param(filter);
        }
        let raw = self.ws.call(session, call).await?;
        unwrap_list(raw, "groups")
    }

    pub async fn retrieve(&self, session: &Authenticated, pk: &str) -> Result<Value, ServiceError> {
        let groups = into_items(self.all(session, Map::new()).await?)?;
        let row = find_by_key(groups, "g_id", pk)
            .ok_or_else(|| ServiceError::NotFound(format!("group {} not found", pk)))?;
        Ok(map_in(&GROUP, &row)?)
    }

    pub async fn create(&self, session: &Authenticated, body: &Value) -> Result<Value, ServiceError> {
        let group = map_out(&GROUP, body)?;
        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "addGroup").param(group))
            .await?;
        created(&GROUP, "id", body, raw)
    }

    pub async fn members(&self, session: &Authenticated, pk: &str) -> Result<Vec<Value>, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getUsersByGroup").param(param("g_id", pk)),
            )
            .await?;
        Ok(map_in_list(&GROUP_MEMBER, &unwrap_list(raw, "users")?)?)
    }

    pub async fn add_member(&self, session: &Authenticated, pk: &str, body: &Value) -> Result<(), ServiceError> {
        self.membership(session, "addUserToGroup", pk, body).await
    }

    pub async fn remove_member(&self, session: &Authenticated, pk: &str, body: &Value) -> Result<(), ServiceError> {
        self.membership(session, "removeUserFromGroup", pk, body).await
    }

    async fn membership(
        &self,
        session: &Authenticated,
        action: &'static str,
        pk: &str,
        body: &Value,
    ) -> Result<(), ServiceError> {
        let mut params = map_out(&GROUP_MEMBERSHIP, body)?;
        if let Value::Object(obj) = &mut params {
            obj.insert("g_id".to_string(), Value::from(pk));
        }

        let ok = self
            .ws
            .call_bool(session, ServiceCall::new(SERVICE_DOMAIN, action).param(params))
            .await?;
        accepted(ok, action)
    }
}

#[async_trait]
impl ListFacet for GroupsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::CLIENT
    }

    fn table(&self) -> &'static MappingTable {
        &GROUP
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        self.all(session, query.filter_object()).await
    }
}
