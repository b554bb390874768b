//! HTTP client for a pRPC endpoint
//!
//! Serializes calls into the request envelope and unwraps the response.
//! RPC-level failures ([`ClientError::Rpc`]) are kept apart from transport
//! failures so callers can tell "the server said no" from "no answer".
//!
//! ```no_run
//! use prpc::client::RpcClient;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = RpcClient::new("http://127.0.0.1:8000");
//! let sum: i64 = client
//!     .call_as("add", vec![json!(10), json!(20)])
//!     .await
//!     .unwrap();
//! assert_eq!(sum, 30);
//! # });
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Params, RequestId, RpcRequest, RpcResponse};

/// Errors returned by [`RpcClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body or the typed result could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// The envelope error code, for RPC-level failures
    pub fn code(&self) -> Option<i64> {
        match self {
            ClientError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Client bound to one server endpoint
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    base_url: String,
    path: String,
}

impl RpcClient {
    /// Client for `base_url`, posting to `/rpc`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_path(base_url, "/rpc")
    }

    pub fn with_path(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            path: path.into(),
        }
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// Call `method` and return the raw result
    pub async fn call(&self, method: &str, params: Params) -> Result<Value, ClientError> {
        let request = RpcRequest::new(
            Some(RequestId::String(Uuid::new_v4().to_string())),
            method,
            params,
        );
        let url = self.endpoint();
        tracing::debug!(method = %method, url = %url, "Sending RPC request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: RpcResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("{} (body: {})", e, text)))?;

        match envelope.error {
            Some(error) => Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            }),
            None => Ok(envelope.result.unwrap_or(Value::Null)),
        }
    }

    /// Call with arguments bound in order
    pub async fn call_positional(&self, method: &str, args: Vec<Value>) -> Result<Value, ClientError> {
        self.call(method, Params::Positional(args)).await
    }

    /// Call with arguments bound by name
    pub async fn call_named(
        &self,
        method: &str,
        args: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        self.call(method, Params::Named(args)).await
    }

    /// Call and decode the result into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Into<Params>,
    ) -> Result<T, ClientError> {
        let value = self.call(method, params.into()).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
