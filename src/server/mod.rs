//! Snapshot HTTP server
//!
//! Serves the persisted artifacts (statuses.json, stations.json) to the map
//! client. Every GET path maps onto a file beneath the storage directory;
//! the path is sanitized component-by-component so a request can never reach
//! outside that root. CORS allows exactly one configured origin; requests
//! from anywhere else get no CORS-permitting headers.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::domain::{SyncError, SyncResult};
use crate::supervisor::ShutdownSignal;

struct ServerState {
    root: PathBuf,
}

/// Build the router: every GET path is looked up beneath `root`
pub fn router(root: PathBuf, cors_origin: &str) -> SyncResult<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .map_err(|_| SyncError::Config(format!("invalid CORS origin: {}", cors_origin)))?;
    // list form: the allow-origin header is echoed only when the request's
    // Origin matches, so disallowed origins get no CORS-permitting headers
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET]);

    Ok(Router::new()
        .fallback(get(serve_file))
        .with_state(Arc::new(ServerState { root }))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Bind and serve until shutdown is broadcast
pub async fn run(config: ServerConfig, root: PathBuf, shutdown: ShutdownSignal) -> SyncResult<()> {
    let app = router(root, &config.cors_origin)?;
    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SyncError::Http(format!("failed to bind {}: {}", addr, e)))?;

    info!(addr = %addr, origin = %config.cors_origin, "snapshot server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .map_err(|e| SyncError::Http(e.to_string()))
}

async fn serve_file(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(relative) = sanitize(uri.path()) else {
        return not_found();
    };

    let path = state.root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type(&path))],
            Body::from(bytes),
        )
            .into_response(),
        Err(_) => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

/// Reduce a request path to a relative path made only of normal components.
/// Anything else (parent references, roots, empty paths) is rejected.
fn sanitize(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut clean = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return None,
        }
    }
    Some(clean)
}

fn content_type(path: &Path) -> HeaderValue {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => HeaderValue::from_static("application/json"),
        Some("html") => HeaderValue::from_static("text/html; charset=utf-8"),
        Some("png") => HeaderValue::from_static("image/png"),
        _ => HeaderValue::from_static("application/octet-stream"),
    }
}
