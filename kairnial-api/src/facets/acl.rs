use crate::facets::unwrap_list;
use crate::mapping::map_in_list;
use crate::mapping::tables::admin::{ACL_GRANT, EMITTER, MODULE};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::{ServiceCall, WsClient};
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "aclmanager";

/// Emitters are scoped to the defects module.
const EMITTERS_SERVICE: &str = "reserves";

pub struct AclFacet {
    ws: Arc<WsClient>,
}

impl AclFacet {
    pub fn new(ws: Arc<WsClient>) -> Self {
        Self { ws }
    }

    pub async fn grants(&self, session: &Authenticated) -> Result<Vec<Value>, ServiceError> {
        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "getAclGrants").cached())
            .await?;
        Ok(map_in_list(&ACL_GRANT, &unwrap_list(raw, "grants")?)?)
    }

    pub async fn modules(&self, session: &Authenticated) -> Result<Vec<Value>, ServiceError> {
        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "getModules").cached())
            .await?;
        Ok(map_in_list(&MODULE, &unwrap_list(raw, "modules")?)?)
    }

    /// Never cached.
    pub async fn emitters(&self, session: &Authenticated) -> Result<Vec<Value>, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getAllowedEmitters").service_override(EMITTERS_SERVICE),
            )
            .await?;
        Ok(map_in_list(&EMITTER, &unwrap_list(raw, "emitters")?)?)
    }
}
