//! HTTP binding
//!
//! A single POST endpoint feeds the request body to the interpreter and
//! returns the envelope with status 200, whatever the envelope's own error
//! code. Only undecodable JSON (400) and unmatched routes (404) are reported
//! through the HTTP status.

use anyhow::Context;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::rpc::interpreter::Interpreter;
use crate::rpc::introspect::describe_all;

/// Shared state for RPC handlers
#[derive(Clone)]
pub struct RpcHttpState {
    pub interpreter: Arc<Interpreter>,
}

/// Routes for the RPC endpoint and its schema, without a router-wide fallback
///
/// Suitable for merging into an existing application; see [`mount`].
pub fn rpc_routes(interpreter: Arc<Interpreter>, path: &str) -> Router {
    let state = RpcHttpState { interpreter };
    let schema_path = format!("{}/schema", path.trim_end_matches('/'));

    Router::new()
        .route(path, post(handle_rpc_post).fallback(fallback_handler))
        .route(&schema_path, get(handle_schema_get).fallback(fallback_handler))
        .with_state(state)
}

/// Standalone router: RPC routes, JSON 404 fallback and request tracing
pub fn rpc_router(interpreter: Arc<Interpreter>, path: &str) -> Router {
    rpc_routes(interpreter, path)
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
}

/// Mount the RPC endpoint onto an existing application router
pub fn mount(app: Router, interpreter: Arc<Interpreter>, path: &str) -> Router {
    app.merge(rpc_routes(interpreter, path))
}

/// Handle POST <path>
async fn handle_rpc_post(State(state): State<RpcHttpState>, body: Bytes) -> Response {
    let payload: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected undecodable request body");
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid JSON" })))
                    .into_response();
            }
        }
    };

    let response = state.interpreter.handle(payload).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Handle GET <path>/schema
async fn handle_schema_get(State(state): State<RpcHttpState>) -> Response {
    let schemas = describe_all(state.interpreter.registry());
    (StatusCode::OK, Json(schemas)).into_response()
}

/// Fallback handler
async fn fallback_handler(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::debug!("Unmatched route: {} {}", method, uri.path());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Cannot {} {}", method, uri.path()),
        })),
    )
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve_on<F>(
    listener: TcpListener,
    interpreter: Arc<Interpreter>,
    path: &str,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = rpc_router(interpreter, path);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, interpreter: Arc<Interpreter>) -> anyhow::Result<()> {
    let (host, port) = config.bind_address();
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let local = listener.local_addr()?;

    let procedures = interpreter.registry().list();
    tracing::info!("pRPC server listening on http://{}{}", local, config.path);
    tracing::info!("Procedures ({}):", procedures.len());
    for name in &procedures {
        tracing::info!("  - {}", name);
    }

    serve_on(listener, interpreter, &config.path, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
