//! crypto/keys.rs
//! Symbolic key lookup.
//!
//! Headers carry a key name, never key material. Decryption resolves the name at call time,
//! so rotating a name to a new key takes effect on the next call. Nothing here caches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::crypto::types::SymmetricKey;

/// Resolve a symbolic key name to key material.
pub trait KeyResolver {
    fn resolve(&self, name: &str) -> Option<SymmetricKey>;
}

impl<F> KeyResolver for F
where
    F: Fn(&str) -> Option<SymmetricKey>,
{
    fn resolve(&self, name: &str) -> Option<SymmetricKey> {
        self(name)
    }
}

/// Resolver shared between a cipher bean and the V2 headers it decodes.
pub type SharedKeyResolver = Arc<dyn KeyResolver + Send + Sync>;

/// In-memory name → key map.
#[derive(Debug, Default, Clone)]
pub struct KeyRing {
    keys: HashMap<String, SymmetricKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a key under `name`.
    pub fn insert(&mut self, name: impl Into<String>, key: impl Into<SymmetricKey>) -> &mut Self {
        self.keys.insert(name.into(), key.into());
        self
    }

    pub fn with_key(mut self, name: impl Into<String>, key: impl Into<SymmetricKey>) -> Self {
        self.insert(name, key);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<SymmetricKey> {
        self.keys.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_shared(self) -> SharedKeyResolver {
        Arc::new(self)
    }
}

impl KeyResolver for KeyRing {
    fn resolve(&self, name: &str) -> Option<SymmetricKey> {
        self.keys.get(name).cloned()
    }
}
