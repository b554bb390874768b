//! Error taxonomy for the request pipeline
//!
//! Every failure inside the interpreter is folded into one of the [`RpcError`]
//! variants and reported inline in the response envelope. Declaration and
//! registry errors happen at startup and never reach the wire.

use thiserror::Error;

use crate::types::ErrorObject;

/// Envelope error codes
pub mod codes {
    /// Malformed or schema-invalid request envelope
    pub const PARSE_ERROR: i64 = 400;
    /// The method is not bound in the registry
    pub const METHOD_NOT_FOUND: i64 = 404;
    /// Argument binding or procedure execution failed
    pub const EXECUTION_ERROR: i64 = 500;
}

/// Errors surfaced to callers through the response envelope
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("Invalid request: {0}")]
    Parse(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    Execution(#[from] ExecutionError),
}

impl RpcError {
    /// Numeric code carried in the envelope
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => codes::PARSE_ERROR,
            RpcError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            RpcError::Execution(_) => codes::EXECUTION_ERROR,
        }
    }

    /// Convert into the wire error object
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<RpcError> for ErrorObject {
    fn from(error: RpcError) -> Self {
        error.to_error_object()
    }
}

/// Failure while binding arguments or running a procedure body
///
/// The message is the textual description of the original failure; no
/// backtrace or type information is attached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Build from a panic payload caught at the procedure boundary
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "procedure panicked".to_string()
        };
        Self { message }
    }
}

impl From<anyhow::Error> for ExecutionError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Invalid procedure declaration, reported when the procedure is built
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("procedure name must not be empty")]
    EmptyName,

    #[error("procedure '{procedure}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { procedure: String, parameter: String },

    #[error("procedure '{procedure}' declares {declared} parameters but its handler takes {arity}")]
    ArityMismatch {
        procedure: String,
        declared: usize,
        arity: usize,
    },

    #[error("procedure '{procedure}': required parameter '{parameter}' follows a parameter with a default")]
    RequiredAfterDefault { procedure: String, parameter: String },
}

/// Registry mutation refused by the configured duplicate policy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("procedure '{0}' is already registered")]
    Duplicate(String),
}

/// Failure while declaring and registering a group of procedures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
