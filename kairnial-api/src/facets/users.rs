use crate::facets::{param, single, ListFacet};
use crate::mapping::tables::admin::USER;
use crate::mapping::{map_in, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{into_items, ListCapability, ListQuery, LIMIT_SKIP, LIMIT_TAKE};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "users";

pub struct UsersFacet {
    ws: Arc<WsClient>,
}

impl UsersFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn retrieve(&self, session: &Authenticated, pk: &str) -> Result<Value, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getFilteredUser").param(param("account_uuid", pk)),
            )
            .await?;

        Ok(map_in(&USER, &single(raw, "user")?)?)
    }
}

#[async_trait]
impl ListFacet for UsersFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::NATIVE
    }

    fn table(&self) -> &'static MappingTable {
        &USER
    }

    /// Rows come from `getUsers`, the total from `getNbUsers` with the same
    /// filter; both run concurrently.
    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        let rows = self.ws.call(
            session,
            ServiceCall::new(SERVICE_DOMAIN, "getUsers").param(query.paged_filter_object()),
        );
        let count = self.ws.call_int(
            session,
            ServiceCall::new(SERVICE_DOMAIN, "getNbUsers").param(query.filter_object()),
        );
        let (rows, total) = futures::try_join!(rows, count)?;

        Ok(json!({
            "total": total,
            "items": into_items(rows)?,
            LIMIT_SKIP: query.page.offset,
            LIMIT_TAKE: query.page.limit,
        }))
    }
}
