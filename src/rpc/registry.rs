//! Name → procedure directory
//!
//! All operations take a single lock; they are O(1) apart from snapshots and
//! never block on user code. Names are listed in first-registration order,
//! and a replaced binding keeps its original position.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::errors::RegistryError;
use super::procedure::Procedure;

/// What to do when a name is registered twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins
    #[default]
    Replace,
    /// Keep the existing binding and report a conflict
    Reject,
}

#[derive(Default)]
struct Entries {
    order: Vec<String>,
    by_name: HashMap<String, Arc<Procedure>>,
}

/// Thread-safe procedure registry
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Entries>,
    policy: DuplicatePolicy,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            policy,
        }
    }

    /// Process-wide default registry, created on first use
    pub fn global() -> Arc<Registry> {
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Bind `name` to `procedure`
    ///
    /// Under [`DuplicatePolicy::Replace`] this never fails.
    pub fn register(
        &self,
        name: impl Into<String>,
        procedure: Arc<Procedure>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.by_name.contains_key(&name) {
            match self.policy {
                DuplicatePolicy::Reject => return Err(RegistryError::Duplicate(name)),
                DuplicatePolicy::Replace => {
                    tracing::debug!(procedure = %name, "Replacing registered procedure");
                }
            }
        } else {
            entries.order.push(name.clone());
        }
        entries.by_name.insert(name, procedure);
        Ok(())
    }

    /// Declare a procedure under its own name
    ///
    /// Inserts exactly once and hands back the shared procedure, which stays
    /// directly callable.
    pub fn declare(&self, procedure: Procedure) -> Result<Arc<Procedure>, RegistryError> {
        let name = procedure.name().to_string();
        self.declare_as(name, procedure)
    }

    /// Declare a procedure under an explicit name
    pub fn declare_as(
        &self,
        name: impl Into<String>,
        procedure: Procedure,
    ) -> Result<Arc<Procedure>, RegistryError> {
        let procedure = Arc::new(procedure);
        self.register(name, Arc::clone(&procedure))?;
        Ok(procedure)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Procedure>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Snapshot of the registered names
    pub fn list(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.order.clone()
    }

    /// Snapshot of all bindings, in list order
    pub fn entries(&self) -> Vec<(String, Arc<Procedure>)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .order
            .iter()
            .filter_map(|name| {
                entries
                    .by_name
                    .get(name)
                    .map(|p| (name.clone(), Arc::clone(p)))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every binding
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.order.clear();
        entries.by_name.clear();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("policy", &self.policy)
            .field("procedures", &self.list())
            .finish()
    }
}
