//! Request interpretation
//!
//! `handle` walks a payload through Parsing → Resolving → Invoking →
//! Responding. Any failure short-circuits to Responding with a coded error;
//! nothing raised by user code escapes.

use serde_json::Value;
use std::sync::Arc;

use super::errors::RpcError;
use super::registry::Registry;
use crate::types::{RequestId, RpcRequest, RpcResponse};

/// Turns untyped JSON payloads into response envelopes
#[derive(Debug, Clone)]
pub struct Interpreter {
    registry: Arc<Registry>,
}

impl Interpreter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Interpreter over the process-wide default registry
    pub fn global() -> Self {
        Self::new(Registry::global())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Handle one request payload
    pub async fn handle(&self, payload: Value) -> RpcResponse {
        // Parsing
        let request = match RpcRequest::from_payload(&payload) {
            Ok(request) => request,
            Err(reason) => {
                let id = RequestId::extract(&payload);
                tracing::debug!(id = ?id, reason = %reason, "Rejected malformed request");
                return RpcResponse::failure(id, &RpcError::Parse(reason));
            }
        };

        let RpcRequest { id, method, params } = request;

        // Resolving
        let Some(procedure) = self.registry.get(&method) else {
            tracing::debug!(method = %method, id = ?id, "Method not found");
            return RpcResponse::failure(id, &RpcError::MethodNotFound(method));
        };

        // Invoking
        tracing::debug!(
            method = %method,
            id = ?id,
            is_async = procedure.is_async(),
            "Dispatching request"
        );
        let outcome = procedure.dispatch(params);

        // Responding
        match outcome.resolve().await {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                tracing::warn!(method = %method, id = ?id, error = %error, "Procedure failed");
                RpcResponse::failure(id, &RpcError::Execution(error))
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::global()
    }
}
