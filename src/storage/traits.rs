use anyhow::Result;
use async_trait::async_trait;

/// Key-value persistence for on-device state (favorites, profile, settings).
///
/// Implementations must serialize operations on a given key: two concurrent
/// writers may interleave, but each read observes a fully written value. The
/// favorites read-after-write cycle in the app context relies on this.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch the value stored under `key`, `None` if it was never written
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Drop `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
