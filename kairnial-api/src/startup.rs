use crate::config::ApiConfig;
use crate::facets::Facets;
use crate::handlers::{self, admin, auth, contacts, controls, defects, dms, projects};
use crate::services::{
    AuthClient, LogOrphanedSlot, TokenVerifier, UploadOrchestrator, WsCache, WsClient,
};
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router, ServiceExt,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::observability::REQUEST_ID_HEADER;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Largest multipart body accepted on document upload.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub auth: Arc<AuthClient>,
    pub ws: Arc<WsClient>,
    pub facets: Arc<Facets>,
}

/// Wire the upstream clients, cache and facets from configuration.
pub fn build_state(config: ApiConfig) -> Result<AppState, anyhow::Error> {
    let verifier = TokenVerifier::from_rsa_pem(
        &config.kairnial.public_key_pem(),
        config.kairnial.issuer(),
    )?;

    let timeout = config.upstream.timeout;
    let cache = Arc::new(WsCache::new(config.upstream.cache_ttl));
    let ws = Arc::new(WsClient::new(&config.kairnial.ws_server, timeout, cache)?);
    let auth = Arc::new(AuthClient::new(&config.kairnial.auth_server, timeout)?);
    let uploads = Arc::new(UploadOrchestrator::new(
        ws.clone(),
        timeout,
        Arc::new(LogOrphanedSlot),
    )?);

    let facets = Arc::new(Facets::new(ws.clone(), auth.clone(), uploads));

    Ok(AppState {
        config: Arc::new(config),
        verifier: Arc::new(verifier),
        auth,
        ws,
        facets,
    })
}

/// Routes below `/{client_id}/{project_id}`.
fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:pk", get(admin::get_user))
        .route(
            "/admin/groups",
            get(admin::list_groups).post(admin::create_group),
        )
        .route("/admin/groups/:pk", get(admin::get_group))
        .route("/admin/groups/:pk/users", get(admin::group_members))
        .route("/admin/groups/:pk/users/add", post(admin::add_group_member))
        .route(
            "/admin/groups/:pk/users/remove",
            post(admin::remove_group_member),
        )
        .route("/admin/modules", get(admin::list_modules))
        .route("/admin/acl/grants", get(admin::list_acl_grants))
        .route("/contacts/contacts", post(contacts::create_contact))
        .route("/contacts/contacts/:pk", get(contacts::get_contact))
        .route(
            "/dms/folders",
            get(dms::list_folders).post(dms::create_folder),
        )
        .route(
            "/dms/folders/:pk",
            get(dms::get_folder)
                .put(dms::update_folder)
                .delete(dms::delete_folder),
        )
        .route(
            "/dms/documents",
            get(dms::list_documents)
                .post(dms::upload_document)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/dms/documents/:pk",
            get(dms::get_document).delete(dms::delete_document),
        )
        .route("/dms/approvals", get(dms::list_approvals))
        .route("/dms/approvals/:pk", delete(dms::delete_approval))
        .route("/controls/folders", get(controls::list_control_folders))
        .route("/defects/defects", get(defects::list_defects))
        .route("/defects/templates", get(defects::list_templates))
        .route(
            "/defects/templates/:pk/elements",
            get(defects::template_elements),
        )
        .route("/defects/emitters", get(defects::list_emitters))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/:client_id/authentication/password",
            post(auth::password_login),
        )
        .route("/:client_id/authentication/key", post(auth::api_key_login))
        .route(
            "/:client_id/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/:client_id/projects/:pk", put(projects::update_project))
        .nest("/:client_id/:project_id", project_routes())
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::route_not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// The router behind trailing-slash normalisation, which must run before
/// routing and so wraps the whole router.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
    state: AppState,
    janitor: JoinHandle<()>,
}

impl Application {
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let host = config.common.host.clone();
        let port = config.common.port;

        let state = build_state(config).map_err(|e| {
            tracing::error!("Failed to build application state: {}", e);
            e
        })?;

        let cache = state.ws.cache().clone();
        let janitor = cache.clone().spawn_janitor(cache.ttl());

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", host, port, e))?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            e
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let app = build_app(state.clone());
        let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            state,
            janitor,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let result = self.server.await;
        self.janitor.abort();
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
