//! Kind-tagged variable store.
//!
//! A store holds named values at exactly one scope. Which stores are
//! consulted, and in which order, is the scope chain's business
//! ([`crate::variables::scope`]); the store itself is pure data with O(1)
//! CRUD.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The scope kind a store is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Transient, highest precedence, cleared at the end of a run.
    Runtime,
    /// Global default, environment-independent.
    Default,
    /// Per-folder default, environment-independent, not shared.
    LocalDefault,
    /// Per-folder default, environment-independent, shared.
    SharedDefault,
    /// Bound to one environment of an environment group.
    Environment,
}

/// A mapping of variable names to values at one scope.
///
/// Values are `serde_json::Value`, which recovers the host's "any"-typed
/// variables as a closed, exhaustively-matchable type. Names are unique
/// within one store; insertion order is irrelevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    kind: StoreKind,
    #[serde(default)]
    values: HashMap<String, Value>,
}

impl VariableStore {
    /// Creates an empty store of the given kind.
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            values: HashMap::new(),
        }
    }

    /// The kind this store was created with. `set` never changes it.
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Checks whether a variable with the given name exists.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the value of a variable, or `None` if not set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets a variable, overwriting any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Removes a variable. Removing a missing name is a no-op.
    pub fn unset(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of variables in the store.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
