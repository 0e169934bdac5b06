use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::traits::PreferenceStore;

/// In-memory preference store. Used as an ephemeral store and, with the
/// write-failure switch, to exercise the persist-then-reflect invariant in
/// context tests.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    map: RwLock<HashMap<String, serde_json::Value>>,
    fail_writes: AtomicBool,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail, simulating a broken disk
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Preference write failed for key '{key}'");
        }
        self.map.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("Preference write failed for key '{key}'");
        }
        self.map.write().await.remove(key);
        Ok(())
    }
}
