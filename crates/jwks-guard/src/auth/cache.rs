//! Key cache capability.
//!
//! The embedding application owns the cache and its eviction policy.
//! Implementations must be safe for concurrent `get`/`set`; the resolver
//! adds no locking of its own.

use crate::auth::public_key::PublicKey;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value store from `kid` to resolved public key.
#[async_trait::async_trait]
pub trait KeyCache: Send + Sync {
    /// Look up a key. `None` means not cached.
    async fn get(&self, kid: &str) -> Option<PublicKey>;

    /// Store a key, replacing any existing entry for `kid`.
    async fn set(&self, kid: &str, key: PublicKey);
}

/// Unbounded in-memory cache. Entries are never evicted.
#[derive(Debug, Default)]
pub struct InMemoryKeyCache {
    keys: RwLock<HashMap<String, PublicKey>>,
}

impl InMemoryKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached keys.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyCache for InMemoryKeyCache {
    async fn get(&self, kid: &str) -> Option<PublicKey> {
        self.keys.read().await.get(kid).cloned()
    }

    async fn set(&self, kid: &str, key: PublicKey) {
        self.keys.write().await.insert(kid.to_string(), key);
    }
}
