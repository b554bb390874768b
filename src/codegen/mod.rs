//! Schema-to-client compiler
//!
//! Walks introspected schemas and renders a client stub: one dispatch helper
//! plus one typed method per procedure. TypeScript is the only target.

pub mod typescript;

use std::path::Path;
use std::str::FromStr;

use crate::rpc::schema::SchemaMap;

/// Errors raised while generating or writing a client
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("Template compile error: {0}")]
    Template(String),

    #[error("Template render error: {0}")]
    Render(String),

    #[error("Target '{0}' is not supported. Use 'ts'.")]
    UnsupportedTarget(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Client language to generate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    TypeScript,
}

impl FromStr for Target {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" | "typescript" => Ok(Target::TypeScript),
            other => Err(CodegenError::UnsupportedTarget(other.to_string())),
        }
    }
}

/// Render a client for `target`
pub fn render(schemas: &SchemaMap, target: Target) -> Result<String, CodegenError> {
    match target {
        Target::TypeScript => typescript::render(schemas),
    }
}

/// Render and write a client file, creating parent directories as needed
pub fn write_client(
    schemas: &SchemaMap,
    target: Target,
    path: impl AsRef<Path>,
) -> Result<(), CodegenError> {
    let path = path.as_ref();
    let io_error = |source| CodegenError::Io {
        path: path.display().to_string(),
        source,
    };

    let content = render(schemas, target)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)?;

    tracing::debug!(path = %path.display(), procedures = schemas.len(), "Wrote client");
    Ok(())
}
