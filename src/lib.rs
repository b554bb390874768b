//! pRPC: typed remote procedures over a single JSON endpoint
//!
//! Procedures are declared with [`Procedure::builder`], registered in a
//! [`Registry`], and served through an [`Interpreter`] that turns request
//! envelopes into response envelopes. Introspection produces JSON-schema
//! descriptions used by the `/schema` endpoint and the client generator.
//!
//! ```
//! use prpc::{Interpreter, Procedure, Registry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(Registry::new());
//! registry
//!     .declare(
//!         Procedure::builder("add")
//!             .params(["a", "b"])
//!             .sync(|a: i64, b: i64| -> anyhow::Result<i64> { Ok(a + b) })
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let interpreter = Interpreter::new(registry);
//! let response = interpreter
//!     .handle(json!({"id": 1, "method": "add", "params": {"a": 10, "b": 20}}))
//!     .await;
//! assert_eq!(response.to_value(), json!({"id": 1, "result": 30, "error": null}));
//! # });
//! ```

pub mod builder;
pub mod cli;
pub mod client;
pub mod codegen;
pub mod config;
pub mod rpc;
pub mod services;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use client::{ClientError, RpcClient};
pub use config::ServerConfig;
pub use rpc::{
    describe, describe_all, DuplicatePolicy, ExecutionError, Interpreter, Procedure,
    ProcedureSchema, Registry, RpcError, SchemaMap,
};
pub use types::{Params, RequestId, RpcRequest, RpcResponse};
