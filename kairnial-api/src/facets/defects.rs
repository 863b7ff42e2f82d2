use crate::facets::{param, unwrap_list, ListFacet};
use crate::mapping::tables::defects::{DEFECT, TEMPLATE, TEMPLATE_ELEMENT};
use crate::mapping::{map_in_list, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{ListCapability, ListQuery};
use crate::services::{ServiceCall, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "reserves";

/// Template elements live with form controls upstream.
const ELEMENTS_SERVICE: &str = "formControls";

pub struct DefectsFacet {
    ws: Arc<WsClient>,
}

impl DefectsFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl ListFacet for DefectsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::NATIVE
    }

    fn table(&self) -> &'static MappingTable {
        &DEFECT
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        self.ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getFlexAllReserves").param(query.paged_filter_object()),
            )
            .await
    }
}

pub struct TemplatesFacet {
    ws: Arc<WsClient>,
}

impl TemplatesFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn elements(&self, session: &Authenticated, pk: &str) -> Result<Vec<Value>, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getAttachedFilesByTemplateId")
                    .param(param("tpl_id", pk))
                    .service_override(ELEMENTS_SERVICE),
            )
            .await?;
        Ok(map_in_list(&TEMPLATE_ELEMENT, &unwrap_list(raw, "elements")?)?)
    }
}

#[async_trait]
impl ListFacet for TemplatesFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::CLIENT
    }

    fn table(&self) -> &'static MappingTable {
        &TEMPLATE
    }

    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        let filter = query.filter_object();
        let mut call = ServiceCall::new(SERVICE_DOMAIN, "getTemplates").cached();
        if !filter.is_empty() {
            call = call.param(filter);
        }
        let raw = self.ws.call(session, call).await?;
        unwrap_list(raw, "templates")
    }
}
