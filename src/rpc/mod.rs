//! Procedure registry and request pipeline
//!
//! ## Modules
//!
//! - [`procedure`] - declared procedures and the declaration builder
//! - [`handler`] - typed handler adapters (sync and async, arity 0..=8)
//! - [`registry`] - thread-safe name → procedure directory
//! - [`schema`] / [`introspect`] - signature descriptions with JSON-schema fragments
//! - [`interpreter`] - request/response state machine
//! - [`errors`] - error taxonomy and envelope codes

pub mod errors;
pub mod handler;
pub mod interpreter;
pub mod introspect;
pub mod procedure;
pub mod registry;
pub mod schema;

pub use errors::{
    codes, DeclarationError, ExecutionError, RegistrationError, RegistryError, RpcError,
};
pub use handler::{AsyncHandler, Invokable, Outcome, SyncHandler};
pub use interpreter::Interpreter;
pub use introspect::{describe, describe_all};
pub use procedure::{ParameterSpec, Procedure, ProcedureBuilder};
pub use registry::{DuplicatePolicy, Registry};
pub use schema::{ParameterSchema, ProcedureSchema, SchemaMap, TypeDescriptor};
