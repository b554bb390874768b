//! Module catalog: constructs registries for the binary
//!
//! A module is a named registration function. Loading a module declares its
//! procedures into a registry, the way importing a service module would.

use std::sync::Arc;
use thiserror::Error;

use crate::rpc::errors::RegistrationError;
use crate::rpc::registry::{DuplicatePolicy, Registry};
use crate::services::demo;

type RegisterFn = fn(&Registry) -> Result<(), RegistrationError>;

/// Modules compiled into the binary
const MODULES: &[(&str, RegisterFn)] = &[("demo", demo::register), ("empty", register_nothing)];

fn register_nothing(_: &Registry) -> Result<(), RegistrationError> {
    Ok(())
}

/// Failure to load a module
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Could not import module '{name}': no such module (available: {available})")]
    Unknown { name: String, available: String },

    #[error("Could not import module '{name}': {source}")]
    Registration {
        name: String,
        #[source]
        source: RegistrationError,
    },
}

/// Names of every available module
pub fn module_names() -> Vec<&'static str> {
    MODULES.iter().map(|(name, _)| *name).collect()
}

/// Declare the procedures of module `name` into `registry`
pub fn load_module(name: &str, registry: &Registry) -> Result<(), ModuleError> {
    let (_, register) = MODULES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| ModuleError::Unknown {
            name: name.to_string(),
            available: module_names().join(", "),
        })?;

    register(registry).map_err(|source| ModuleError::Registration {
        name: name.to_string(),
        source,
    })?;
    tracing::debug!(module = %name, procedures = registry.len(), "Loaded module");
    Ok(())
}

/// Build a fresh registry holding module `name`
pub fn build_registry(name: &str, policy: DuplicatePolicy) -> Result<Arc<Registry>, ModuleError> {
    let registry = Arc::new(Registry::with_policy(policy));
    load_module(name, &registry)?;
    Ok(registry)
}
