//! In-memory ledger.
//!
//! Namespaces are ordered maps behind a single `parking_lot::RwLock`, which
//! keeps prefix scans deterministic. Suitable for tests and single-node demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use veil_types::ProgramDefinition;

use crate::error::{StorageError, StorageResult};
use crate::ledger::{LedgerState, ProgramDefinitions};

type Namespaces = HashMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Clone, Default)]
pub struct MemoryLedger {
    namespaces: Arc<RwLock<Namespaces>>,
    definitions: Arc<RwLock<HashMap<String, ProgramDefinition>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// View of a single namespace. Views share the underlying store.
    pub fn namespace(&self, namespace: impl Into<String>) -> NamespacedState {
        NamespacedState {
            namespace: namespace.into(),
            namespaces: self.namespaces.clone(),
        }
    }

    /// Commits (or upgrades) a program definition.
    pub fn define_program(&self, definition: ProgramDefinition) {
        debug!(
            program_id = %definition.program_id,
            sequence = definition.sequence,
            "Defining program"
        );
        self.definitions
            .write()
            .insert(definition.program_id.clone(), definition);
    }

    pub fn key_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .get(namespace)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

impl ProgramDefinitions for MemoryLedger {
    fn program_definition(&self, program_id: &str) -> StorageResult<Option<ProgramDefinition>> {
        Ok(self.definitions.read().get(program_id).cloned())
    }
}

/// One namespace of a [`MemoryLedger`].
#[derive(Clone)]
pub struct NamespacedState {
    namespace: String,
    namespaces: Arc<RwLock<Namespaces>>,
}

impl NamespacedState {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

fn check_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    Ok(())
}

impl LedgerState for NamespacedState {
    fn get_state(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self
            .namespaces
            .read()
            .get(&self.namespace)
            .and_then(|ns| ns.get(key).cloned()))
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        check_key(key)?;
        self.namespaces
            .write()
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn del_state(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        if let Some(ns) = self.namespaces.write().get_mut(&self.namespace) {
            ns.remove(key);
        }
        Ok(())
    }

    fn state_by_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let guard = self.namespaces.read();
        let Some(ns) = guard.get(&self.namespace) else {
            return Ok(Vec::new());
        };
        Ok(ns
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
