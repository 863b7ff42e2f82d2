use crate::facets::{created, param, single};
use crate::mapping::tables::contacts::CONTACT;
use crate::mapping::{map_in, map_out};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::{ServiceCall, WsClient};
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "contacts";

pub struct ContactsFacet {
    ws: Arc<WsClient>,
}

impl ContactsFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn retrieve(&self, session: &Authenticated, pk: &str) -> Result<Value, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getItem").param(param("contact_id", pk)),
            )
            .await?;
        Ok(map_in(&CONTACT, &single(raw, "contact")?)?)
    }

    pub async fn create(&self, session: &Authenticated, body: &Value) -> Result<Value, ServiceError> {
        let contact = map_out(&CONTACT, body)?;
        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "addContact").param(contact))
            .await?;
        created(&CONTACT, "id", body, raw)
    }
}
