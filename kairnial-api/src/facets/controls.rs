use crate::facets::ListFacet;
use crate::mapping::tables::controls::CONTROL;
use crate::mapping::MappingTable;
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{ListCapability, ListQuery};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "controls";

pub struct ControlsFacet {
    ws: Arc<WsClient>,
}

impl ControlsFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl ListFacet for ControlsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::NATIVE
    }

    fn table(&self) -> &'static MappingTable {
        &CONTROL
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
