//! The WS envelope: the single path through which facets reach the
//! upstream WebServices backend.
//!
//! Every call is `POST <ws>/user/<uuid>/<domain>.<action>` with a JSON body
//! of the form `{headers, params, service}`. Failures are folded into
//! [`ServiceError::WsService`]: HTTP status for non-2xx answers, `0` for an
//! undecodable body, the embedded `errorCode` for `{error, errorCode}`
//! payloads and `502` when the transport itself failed.

use crate::middleware::context::Authenticated;
use crate::services::cache::{fingerprint, WsCache};
use crate::services::error::{ServiceError, TRANSPORT_FAILURE_STATUS};
use metrics::{counter, histogram};
use serde_json::{json, Value};
use service_core::observability::TracedClientExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

const APP_TYPE: &str = "api";
const R_VERSION: &str = "8.1";
const SYSTEM_VERSION: &str = "rsoHTMLv8";
const USER_LANGUAGE: &str = "fr";

/// Action prefixes that change upstream state and must never be cached.
const MUTATING_PREFIXES: [&str; 6] = ["add", "update", "archive", "remove", "delete", "prepare"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    #[default]
    Json,
    Bool,
    Int,
}

/// One upstream RPC, built by a facet and resolved by [`WsClient::call`].
#[derive(Debug, Clone)]
pub struct ServiceCall {
    pub service_domain: &'static str,
    pub action: &'static str,
    pub params: Vec<Value>,
    pub use_cache: bool,
    pub service_override: Option<String>,
    pub format: ResultFormat,
}

impl ServiceCall {
    pub fn new(service_domain: &'static str, action: &'static str) -> Self {
        Self {
            service_domain,
            action,
            params: Vec::new(),
            use_cache: false,
            service_override: None,
            format: ResultFormat::Json,
        }
    }

    pub fn param(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn cached(mut self) -> Self {
        self.use_cache = true;
        self
    }

    /// Send `service` instead of the request's project id.
    pub fn service_override(mut self, service: impl Into<String>) -> Self {
        self.service_override = Some(service.into());
        self
    }

    pub fn format(mut self, format: ResultFormat) -> Self {
        self.format = format;
        self
    }

    pub fn is_mutation(&self) -> bool {
        MUTATING_PREFIXES
            .iter()
            .any(|prefix| self.action.starts_with(prefix))
    }

    pub fn cacheable(&self) -> bool {
        self.use_cache && !self.is_mutation()
    }

    pub fn qualified_action(&self) -> String {
        format!("{}.{}", self.service_domain, self.action)
    }
}

pub struct WsClient {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<WsCache>,
}

impl WsClient {
    pub fn new(base_url: &str, timeout: Duration, cache: Arc<WsCache>) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build WS HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<WsCache> {
        &self.cache
    }

    pub fn url(&self, user_uuid: &str, call: &ServiceCall) -> String {
        format!("{}/user/{}/{}", self.base_url, user_uuid, call.qualified_action())
    }

    /// Resolve a call, going through the cache when it is cacheable.
    pub async fn call(&self, session: &Authenticated, call: ServiceCall) -> Result<Value, ServiceError> {
        let service = match &call.service_override {
            Some(service) => service.as_str(),
            None => session.project()?,
        };

        let value = if call.cacheable() {
            let key = fingerprint(
                call.service_domain,
                call.action,
                &call.params,
                service,
                session.user_uuid(),
            );
            self.cache
                .get_or_try_insert(&key, || self.send(session, &call, service))
                .await?
        } else {
            self.send(session, &call, service).await?
        };

        coerce(call.format, value)
    }

    /// Resolve a call whose upstream answer is a boolean acknowledgement.
    pub async fn call_bool(&self, session: &Authenticated, call: ServiceCall) -> Result<bool, ServiceError> {
        let value = self.call(session, call.format(ResultFormat::Bool)).await?;
        value.as_bool().ok_or_else(ServiceError::invalid_response)
    }

    pub async fn call_int(&self, session: &Authenticated, call: ServiceCall) -> Result<i64, ServiceError> {
        let value = self.call(session, call.format(ResultFormat::Int)).await?;
        value.as_i64().ok_or_else(ServiceError::invalid_response)
    }

    async fn send(
        &self,
        session: &Authenticated,
        call: &ServiceCall,
        service: &str,
    ) -> Result<Value, ServiceError> {
        let url = self.url(session.user_uuid(), call);
        let body = envelope(&call.params, service);
        let started = Instant::now();

        tracing::debug!(
            service_domain = call.service_domain,
            action = call.action,
            user_id = session.user_uuid(),
            "Calling WS"
        );

        let result = async {
            let response = self
                .client
                .traced_post(&url)
                .bearer_auth(session.token())
                .json(&body)
                .request_id(session.request_id.as_deref())
                .send()
                .await
                .map_err(transport_error)?;

            decode_response(response).await
        }
        .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ServiceError::WsService { status, .. }) if *status == TRANSPORT_FAILURE_STATUS => {
                "transport_error"
            }
            Err(_) => "ws_error",
        };
        counter!(
            "ws_calls_total",
            "domain" => call.service_domain,
            "action" => call.action,
            "outcome" => outcome
        )
        .increment(1);
        histogram!("ws_call_duration_seconds", "domain" => call.service_domain)
            .record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(
                service_domain = call.service_domain,
                action = call.action,
                error = %e,
                "WS call failed"
            );
        }

        result
    }
}

/// Frame parameters in the body the WS backend expects.
pub fn envelope(params: &[Value], service: &str) -> Value {
    json!({
        "headers": {
            "AppType": APP_TYPE,
            "machineid": Uuid::new_v4().to_string(),
            "RVersion": R_VERSION,
            "SystemVersion": SYSTEM_VERSION,
            "UserLanguage": USER_LANGUAGE,
        },
        "params": params,
        "service": service,
    })
}

pub(crate) fn transport_error(e: reqwest::Error) -> ServiceError {
    tracing::error!("Upstream transport failure: {}", e);
    ServiceError::ws(TRANSPORT_FAILURE_STATUS, format!("upstream unreachable: {}", e))
}

/// Classify an upstream HTTP response into a JSON value or a WS error.
pub(crate) async fn decode_response(response: reqwest::Response) -> Result<Value, ServiceError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(ServiceError::ws(i64::from(status.as_u16()), text));
    }

    let value: Value = serde_json::from_str(&text).map_err(|_| ServiceError::invalid_response())?;
    embedded_error(&value).map_or(Ok(value), Err)
}

/// `{error, errorCode}` bodies are failures even on HTTP 200.
fn embedded_error(value: &Value) -> Option<ServiceError> {
    let obj = value.as_object()?;
    let error = obj.get("error")?;

    let message = match error {
        Value::Null | Value::Bool(false) => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let code = match obj.get("errorCode") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };

    Some(ServiceError::ws(code, message))
}

fn coerce(format: ResultFormat, value: Value) -> Result<Value, ServiceError> {
    match format {
        ResultFormat::Json => Ok(value),
        ResultFormat::Bool => match &value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => Ok(Value::Bool(n.as_i64().is_some_and(|i| i != 0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" | "" => Ok(Value::Bool(false)),
                _ => Err(ServiceError::invalid_response()),
            },
            Value::Null => Ok(Value::Bool(false)),
            _ => Err(ServiceError::invalid_response()),
        },
        ResultFormat::Int => match &value {
            Value::Number(n) => n.as_i64().map(Value::from).ok_or_else(ServiceError::invalid_response),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ServiceError::invalid_response()),
            _ => Err(ServiceError::invalid_response()),
        },
    }
}
