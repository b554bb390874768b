//! Transport bindings for the interpreter

pub mod http;

pub use http::{mount, rpc_router, rpc_routes, serve, serve_on};
