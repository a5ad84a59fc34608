//! Where program encryption keys come from.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use veil_registry::{EnclaveRegistry, RegistryError};
use veil_storage::LedgerState;

use crate::error::{ClientError, ClientResult};

pub trait KeySource: Send + Sync {
    /// SEC1 public encryption key of `program_id`.
    fn encryption_key(&self, program_id: &str) -> ClientResult<Vec<u8>>;
}

/// Reads keys straight from registry state on every call.
pub struct RegistryKeySource {
    registry: Arc<EnclaveRegistry>,
    state: Arc<dyn LedgerState>,
}

impl RegistryKeySource {
    pub fn new(registry: Arc<EnclaveRegistry>, state: Arc<dyn LedgerState>) -> Self {
        Self { registry, state }
    }
}

impl KeySource for RegistryKeySource {
    fn encryption_key(&self, program_id: &str) -> ClientResult<Vec<u8>> {
        match self.registry.get_encryption_key(self.state.as_ref(), program_id) {
            Ok(key) => Ok(key),
            Err(RegistryError::NoEnclave(_)) => Err(ClientError::NoEncryptionKey(program_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Memoizes keys per program id.
pub struct CachedKeySource<S> {
    inner: S,
    cache: RwLock<HashMap<String, Vec<u8>>>,
}

impl<S: KeySource> CachedKeySource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Drops the cached key so the next call refetches it.
    pub fn invalidate(&self, program_id: &str) {
        self.cache.write().remove(program_id);
    }
}

impl<S: KeySource> KeySource for CachedKeySource<S> {
    fn encryption_key(&self, program_id: &str) -> ClientResult<Vec<u8>> {
        if let Some(key) = self.cache.read().get(program_id) {
            return Ok(key.clone());
        }
        let key = self.inner.encryption_key(program_id)?;
        debug!(program_id, "Caching program encryption key");
        self.cache.write().insert(program_id.to_string(), key.clone());
        Ok(key)
    }
}
