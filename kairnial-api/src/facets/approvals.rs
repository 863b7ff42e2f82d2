use crate::facets::{accepted, param, unwrap_list, ListFacet};
use crate::mapping::tables::dms::APPROVAL_CIRCUIT;
use crate::mapping::MappingTable;
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{ListCapability, ListQuery};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "fichiers";

/// Approval ("visa") circuits.
pub struct ApprovalsFacet {
    ws: Arc<WsClient>,
}

impl ApprovalsFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn destroy(&self, session: &Authenticated, pk: &str) -> Result<(), ServiceError> {
        let ok = self
            .ws
            .call_bool(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "archiveCircuitVisa").param(param("circuit_id", pk)),
            )
            .await?;
        accepted(ok, "archiveCircuitVisa")
    }
}

#[async_trait]
impl ListFacet for ApprovalsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::CLIENT
    }

    fn table(&self) -> &'static MappingTable {
        &APPROVAL_CIRCUIT
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getAllCircuitVisa").param(query.filter_object()),
            )
            .await?;
        unwrap_list(raw, "circuits")
    }
}
