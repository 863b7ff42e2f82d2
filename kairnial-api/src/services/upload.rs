//! Three-phase document upload: reserve a slot, push the bytes to the
//! signed URL, then commit the metadata.

use crate::mapping::tables::dms::{DOCUMENT, DOCUMENT_WRITE, UPLOAD_TICKET};
use crate::mapping::{map_in, map_out};
use crate::middleware::context::Authenticated;
use crate::services::error::{ServiceError, TRANSPORT_FAILURE_STATUS};
use crate::services::ws_client::{ServiceCall, WsClient};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Method;
use serde_json::{json, Value};
use service_core::observability::TracedClientExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SERVICE_DOMAIN: &str = "fichiers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Prepare,
    Transfer,
    Commit,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadPhase::Prepare => "prepare",
            UploadPhase::Transfer => "transfer",
            UploadPhase::Commit => "commit",
        })
    }
}

/// Upload slot issued by `prepareFileUpload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub uuid: String,
    pub files_path: String,
    pub method: Method,
    pub url: String,
}

impl UploadTicket {
    fn from_response(raw: &Value) -> Result<Self, ServiceError> {
        let mapped = map_in(&UPLOAD_TICKET, raw).map_err(|e| {
            tracing::warn!(error = %e, "Malformed upload ticket");
            ServiceError::invalid_response()
        })?;
        let field = |name: &str| mapped[name].as_str().unwrap_or_default().to_string();

        let method = match field("method").to_ascii_uppercase().as_str() {
            "PUT" => Method::PUT,
            "POST" => Method::POST,
            _ => return Err(ServiceError::invalid_response()),
        };

        Ok(Self {
            uuid: field("uuid"),
            files_path: field("files_path"),
            method,
            url: field("url"),
        })
    }
}

/// A file received from the client plus its public metadata.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Milliseconds since the epoch.
    pub last_modified: i64,
    /// Public fields of the document (`folder_id`, `title`, `visas`, ...).
    pub metadata: Value,
}

impl UploadRequest {
    fn name_and_extension(&self) -> (String, String) {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_ascii_lowercase()),
            _ => (self.file_name.clone(), String::new()),
        }
    }
}

/// Called when a reserved slot will not be committed.
#[async_trait]
pub trait UploadCompensation: Send + Sync {
    async fn release(&self, ticket: &UploadTicket, failed: UploadPhase, error: &ServiceError);
}

/// Upstream exposes no cancel action, so orphaned slots are only reported.
pub struct LogOrphanedSlot;

#[async_trait]
impl UploadCompensation for LogOrphanedSlot {
    async fn release(&self, ticket: &UploadTicket, failed: UploadPhase, error: &ServiceError) {
        tracing::warn!(
            upload_uuid = %ticket.uuid,
            files_path = %ticket.files_path,
            phase = %failed,
            error = %error,
            "Upload slot orphaned"
        );
    }
}

pub struct UploadOrchestrator {
    ws: Arc<WsClient>,
    transfer: reqwest::Client,
    compensation: Arc<dyn UploadCompensation>,
}

impl UploadOrchestrator {
    pub fn new(
        ws: Arc<WsClient>,
        timeout: Duration,
        compensation: Arc<dyn UploadCompensation>,
    ) -> Result<Self, anyhow::Error> {
        let transfer = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build transfer HTTP client: {}", e))?;

        Ok(Self {
            ws,
            transfer,
            compensation,
        })
    }

    pub async fn upload(&self, session: &Authenticated, request: UploadRequest) -> Result<Value, ServiceError> {
        // Validate metadata before reserving anything upstream.
        let metadata = map_out(&DOCUMENT_WRITE, &request.metadata)?;
        let (name, ext) = request.name_and_extension();
        let size = request.bytes.len() as i64;

        let ticket = self
            .prepare(session, &request, &name, &ext, size)
            .await
            .inspect_err(|_| record_failure(UploadPhase::Prepare))?;

        tracing::info!(
            upload_uuid = %ticket.uuid,
            method = %ticket.method,
            size,
            "Upload slot reserved"
        );

        if let Err(e) = self.transfer(session, &ticket, &request).await {
            return Err(self.fail(&ticket, UploadPhase::Transfer, e).await);
        }

        let mut commit = metadata;
        if let Value::Object(obj) = &mut commit {
            obj.insert("uuid".to_string(), Value::from(ticket.uuid.as_str()));
            obj.insert("files_path".to_string(), Value::from(ticket.files_path.as_str()));
            obj.insert("name".to_string(), Value::from(name.as_str()));
            obj.insert("ext".to_string(), Value::from(ext.as_str()));
            obj.insert("size".to_string(), Value::from(size));
            obj.insert("type".to_string(), Value::from(request.content_type.as_str()));
            obj.insert("lastModified".to_string(), Value::from(request.last_modified));
        }

        let committed = match self
            .ws
            .call(session, ServiceCall::new(SERVICE_DOMAIN, "addFile").param(commit))
            .await
        {
            Ok(v) => v,
            Err(e) => return Err(self.fail(&ticket, UploadPhase::Commit, e).await),
        };

        tracing::info!(upload_uuid = %ticket.uuid, "Upload committed");
        Ok(map_in(&DOCUMENT, &committed)?)
    }

    async fn prepare(
        &self,
        session: &Authenticated,
        request: &UploadRequest,
        name: &str,
        ext: &str,
        size: i64,
    ) -> Result<UploadTicket, ServiceError> {
        let call = ServiceCall::new(SERVICE_DOMAIN, "prepareFileUpload").param(json!({
            "name": name,
            "ext": ext,
            "size": size,
            "lastModified": request.last_modified,
            "type": request.content_type,
            "guid": Uuid::new_v4().to_string(),
        }));

        let raw = self.ws.call(session, call).await?;
        UploadTicket::from_response(&raw)
    }

    /// Push bytes to the signed URL. The caller's token is not sent there.
    async fn transfer(
        &self,
        session: &Authenticated,
        ticket: &UploadTicket,
        request: &UploadRequest,
    ) -> Result<(), ServiceError> {
        let response = self
            .transfer
            .traced_request(ticket.method.clone(), &ticket.url)
            .header("Content-Type", &request.content_type)
            .body(request.bytes.clone())
            .request_id(session.request_id.as_deref())
            .send()
            .await
            .map_err(|e| ServiceError::ws(TRANSPORT_FAILURE_STATUS, format!("upload transfer failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ws(
                TRANSPORT_FAILURE_STATUS,
                format!("upload target answered {}", status.as_u16()),
            ));
        }
        Ok(())
    }

    async fn fail(&self, ticket: &UploadTicket, phase: UploadPhase, error: ServiceError) -> ServiceError {
        record_failure(phase);
        self.compensation.release(ticket, phase, &error).await;
        error
    }
}

fn record_failure(phase: UploadPhase) {
    counter!("upload_phase_failures_total", "phase" => phase.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::WsCache;
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<UploadPhase>>);

    #[async_trait]
    impl UploadCompensation for Recorder {
        async fn release(&self, _ticket: &UploadTicket, failed: UploadPhase, _error: &ServiceError) {
            self.0.lock().unwrap().push(failed);
        }
    }

    fn orchestrator(ws: &MockServer, recorder: Arc<Recorder>) -> UploadOrchestrator {
        let ws = Arc::new(
            WsClient::new(&ws.uri(), Duration::from_secs(5), Arc::new(WsCache::new(Duration::from_secs(60))))
                .unwrap(),
        );
        UploadOrchestrator::new(ws, Duration::from_secs(5), recorder).unwrap()
    }

    fn request() -> UploadRequest {
        UploadRequest {
            file_name: "Plan RDC.PDF".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
            last_modified: 1_700_000_000_000,
            metadata: json!({"folder_id": 4, "title": "Plan", "visas": [{"id": 1}]}),
        }
    }

    async fn mount_prepare(ws: &MockServer, target: &MockServer) {
        Mock::given(method("POST"))
            .and(path_regex(r"/fichiers\.prepareFileUpload$"))
            .and(body_partial_json(json!({"params": [{"name": "Plan RDC", "ext": "pdf", "size": 8}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uuid": "0b9a6d3e-51c4-4d7e-8f11-2f0e7c3b9a10",
                "files_path": "/tmp/slot",
                "method": "put",
                "url": format!("{}/signed", target.uri()),
            })))
            .expect(1)
            .mount(ws)
            .await;
    }

    #[test]
    fn file_name_splits_on_last_dot() {
        let mut r = request();
        assert_eq!(r.name_and_extension(), ("Plan RDC".to_string(), "pdf".to_string()));
        r.file_name = ".env".to_string();
        assert_eq!(r.name_and_extension(), (".env".to_string(), String::new()));
        r.file_name = "archive.tar.gz".to_string();
        assert_eq!(r.name_and_extension(), ("archive.tar".to_string(), "gz".to_string()));
    }

    #[tokio::test]
    async fn runs_all_three_phases() {
        let ws = MockServer::start().await;
        let target = MockServer::start().await;
        mount_prepare(&ws, &target).await;

        Mock::given(method("PUT"))
            .and(path("/signed"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&target)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"/fichiers\.addFile$"))
            .and(body_partial_json(json!({"params": [{
                "uuid": "0b9a6d3e-51c4-4d7e-8f11-2f0e7c3b9a10",
                "fcat_id": 4,
                "visas": "[{\"id\":1}]",
                "rfield": "[]",
            }]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files_id": 77,
                "files_name": "Plan RDC.pdf",
            })))
            .expect(1)
            .mount(&ws)
            .await;

        let recorder = Arc::new(Recorder::default());
        let doc = orchestrator(&ws, recorder.clone())
            .upload(&Authenticated::for_tests(Some("proj1")), request())
            .await
            .unwrap();

        assert_eq!(doc["id"], 77);
        assert!(recorder.0.lock().unwrap().is_empty());

        let transfer = &target.received_requests().await.unwrap()[0];
        assert!(transfer.headers.get("authorization").is_none());
        assert_eq!(transfer.body, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn transfer_failure_is_502_and_compensated() {
        let ws = MockServer::start().await;
        let target = MockServer::start().await;
        mount_prepare(&ws, &target).await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&target)
            .await;
        Mock::given(path_regex(r"/fichiers\.addFile$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&ws)
            .await;

        let recorder = Arc::new(Recorder::default());
        let err = orchestrator(&ws, recorder.clone())
            .upload(&Authenticated::for_tests(Some("proj1")), request())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::WsService { status: 502, .. }));
        assert_eq!(*recorder.0.lock().unwrap(), vec![UploadPhase::Transfer]);
    }

    #[tokio::test]
    async fn commit_error_keeps_upstream_code() {
        let ws = MockServer::start().await;
        let target = MockServer::start().await;
        mount_prepare(&ws, &target).await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&target)
            .await;
        Mock::given(path_regex(r"/fichiers\.addFile$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "dup", "errorCode": 17})))
            .mount(&ws)
            .await;

        let recorder = Arc::new(Recorder::default());
        let err = orchestrator(&ws, recorder.clone())
            .upload(&Authenticated::for_tests(Some("proj1")), request())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::WsService { status: 17, ref message } if message == "dup"));
        assert_eq!(*recorder.0.lock().unwrap(), vec![UploadPhase::Commit]);
    }

    #[tokio::test]
    async fn invalid_metadata_reserves_nothing() {
        let ws = MockServer::start().await;
        let recorder = Arc::new(Recorder::default());

        let mut req = request();
        req.metadata = json!({"title": "no folder"});
        let err = orchestrator(&ws, recorder)
            .upload(&Authenticated::for_tests(Some("proj1")), req)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Mapping(_)));
        assert!(ws.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_ticket_is_invalid_response() {
        let ws = MockServer::start().await;
        Mock::given(path_regex(r"/fichiers\.prepareFileUpload$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": "x"})))
            .mount(&ws)
            .await;

        let recorder = Arc::new(Recorder::default());
        let err = orchestrator(&ws, recorder.clone())
            .upload(&Authenticated::for_tests(Some("proj1")), request())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::WsService { status: 0, .. }));
        assert!(recorder.0.lock().unwrap().is_empty());
    }
}
