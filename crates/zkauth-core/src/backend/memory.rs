//! Reference in-memory storage backend.
//!
//! Stores full `EncryptedShare` records under `"<tag>:<userId>:share"` keys
//! and issues mock receipts. Used by the test suites and as the reference
//! shape for real backend implementations; production stores must back
//! `has`/`get` with durable storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use zkauth_crypto::EncryptedShare;

use super::{BackendTag, ShareBackend};
use crate::error::{AuthError, Result};

/// In-memory share store for one backend tag.
pub struct MemoryBackend {
    tag: BackendTag,
    records: RwLock<HashMap<String, EncryptedShare>>,
    available: AtomicBool,
    put_counter: AtomicU64,
}

impl MemoryBackend {
    /// Create an empty backend for `tag`.
    pub fn new(tag: BackendTag) -> Self {
        Self {
            tag,
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            put_counter: AtomicU64::new(0),
        }
    }

    fn storage_key(&self, user_id: &str) -> String {
        format!("{}:{user_id}:share", self.tag)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::BackendUnavailable(format!(
                "{} backend is offline",
                self.tag
            )))
        }
    }

    /// Simulate an outage (or recovery) of this backend.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drop the stored share for a user. Returns whether one existed.
    pub async fn remove(&self, user_id: &str) -> bool {
        let key = self.storage_key(user_id);
        self.records.write().await.remove(&key).is_some()
    }

    /// Replace the stored share without going through `put` (test hook for
    /// tamper scenarios).
    pub async fn overwrite(&self, user_id: &str, share: EncryptedShare) {
        let key = self.storage_key(user_id);
        self.records.write().await.insert(key, share);
    }
}

#[async_trait]
impl ShareBackend for MemoryBackend {
    fn tag(&self) -> BackendTag {
        self.tag
    }

    async fn put(&self, user_id: &str, share: EncryptedShare) -> Result<String> {
        self.check_available()?;
        let key = self.storage_key(user_id);
        self.records.write().await.insert(key, share);
        let serial = self.put_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("mem:{}:{serial}", self.tag))
    }

    async fn get(&self, user_id: &str) -> Result<Option<EncryptedShare>> {
        self.check_available()?;
        let key = self.storage_key(user_id);
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn has(&self, user_id: &str) -> Result<bool> {
        self.check_available()?;
        let key = self.storage_key(user_id);
        Ok(self.records.read().await.contains_key(&key))
    }
}
