//! Demo service types
//!
//! Plain domain types; schemars derives give them full schemas in
//! introspection output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    /// Numeric identifier
    pub id: i64,
    /// Display name
    pub name: String,
    pub email: String,
}

/// Server status snapshot
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Status {
    pub status: String,
    pub version: String,
    /// RFC 3339 timestamp of the snapshot
    pub timestamp: String,
}
