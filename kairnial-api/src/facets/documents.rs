use crate::facets::{accepted, param, single, unwrap_list, ListFacet};
use crate::mapping::tables::dms::{DOCUMENT, DOCUMENT_DETAIL};
use crate::mapping::{map_in, MappingTable};
use crate::middleware::context::Authenticated;
use crate::services::error::ServiceError;
use crate::services::pagination::{ListCapability, ListQuery};
use crate::services::{ServiceCall, UploadOrchestrator, UploadRequest, WsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const SERVICE_DOMAIN: &str = "fichiers";

/// Upstream key of the `folder_id` filter.
const FOLDER_KEY: &str = "files_fcat_id";

pub struct DocumentsFacet {
    ws: Arc<WsClient>,
    uploads: Arc<UploadOrchestrator>,
}

impl DocumentsFacet {
    pub fn new(ws: Arc<WsClient>, uploads: Arc<UploadOrchestrator>) -> Self {
        Self { ws, uploads }
    }

    /// Header and approval steps of one document.
    pub async fn retrieve(&self, session: &Authenticated, pk: &str) -> Result<Value, ServiceError> {
        let raw = self
            .ws
            .call(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "getFilesHeaderAndVisas").param(param("files_id", pk)),
            )
            .await?;
        Ok(map_in(&DOCUMENT_DETAIL, &single(raw, "document")?)?)
    }

    pub async fn create(&self, session: &Authenticated, request: UploadRequest) -> Result<Value, ServiceError> {
        self.uploads.upload(session, request).await
    }

    pub async fn destroy(&self, session: &Authenticated, pk: &str) -> Result<(), ServiceError> {
        let ok = self
            .ws
            .call_bool(
                session,
                ServiceCall::new(SERVICE_DOMAIN, "archiveFile").param(param("files_id", pk)),
            )
            .await?;
        accepted(ok, "archiveFile")
    }
}

#[async_trait]
impl ListFacet for DocumentsFacet {
    fn capability(&self) -> ListCapability {
        ListCapability::CLIENT
    }

    fn table(&self) -> &'static MappingTable {
        &DOCUMENT
    }

    /// Documents are listed per folder; `folder_id` is mandatory.
    async fn list(&self, session: &Authenticated, query: &ListQuery) -> Result<Value, ServiceError> {
        let mut filter = query.filter_object();
        let folder = filter
            .remove(FOLDER_KEY)
            .ok_or_else(|| ServiceError::InvalidRequest("folder_id is required".to_string()))?;
        filter.insert("fcat_id".to_string(), folder);

        let raw = self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "getFilesFromCat").param(filter))
            .await?;
        unwrap_list(raw, "files")
    }
}
