use std::sync::Arc;

use hypotenuse_kv::{KVError, KVStore};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::tree::StateTree;

/// Mirrors the persistent segment of the state tree into a [`KVStore`].
///
/// The whole segment is serialized as JSON under a single key on every
/// save; there is no incremental persistence. Saves run one at a time, in
/// the order they acquire the save lock.
pub struct Persistence {
    kv: Arc<dyn KVStore>,
    storage_key: String,
    save_lock: tokio::sync::Mutex<()>,
}

impl Persistence {
    pub fn new(kv: Arc<dyn KVStore>, storage_key: impl Into<String>) -> Self {
        Self {
            kv,
            storage_key: storage_key.into(),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Load the stored segment and overlay `initial` on top of it.
    ///
    /// A missing key loads as an empty mapping. Keys in `initial` replace
    /// loaded keys of the same name (shallow, one level deep).
    pub fn load(&self, initial: StateTree) -> Result<StateTree, StoreError> {
        let mut segment = match self.kv.get(&self.storage_key)? {
            None => {
                debug!("no persisted state under '{}'", self.storage_key);
                StateTree::new()
            }
            Some(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(KVError::Serialization(format!(
                        "expected a JSON object under '{}', found {}",
                        self.storage_key,
                        json_kind(&other)
                    ))
                    .into())
                }
                Err(e) => return Err(KVError::Serialization(e.to_string()).into()),
            },
        };

        debug!(
            "loaded {} persisted keys from '{}', {} initial overrides",
            segment.len(),
            self.storage_key,
            initial.len()
        );
        segment.extend(initial);
        Ok(segment)
    }

    /// Serialize and write the whole persistent segment.
    ///
    /// The write runs on the blocking pool; the returned future settles only
    /// once the backend has accepted (or rejected) the bytes.
    pub async fn save(&self, segment: &StateTree) -> Result<(), StoreError> {
        let _guard = self.save_lock.lock().await;
        self.write(segment).await
    }

    /// Take a snapshot under the save lock and write it.
    ///
    /// Concurrent callers never overwrite a newer snapshot with an older
    /// one: whichever save runs last writes the segment as it is then.
    pub async fn save_latest<F>(&self, snapshot: F) -> Result<(), StoreError>
    where
        F: FnOnce() -> StateTree,
    {
        let _guard = self.save_lock.lock().await;
        let segment = snapshot();
        self.write(&segment).await
    }

    async fn write(&self, segment: &StateTree) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(segment).map_err(|e| KVError::Serialization(e.to_string()))?;
        let kv = Arc::clone(&self.kv);
        let key = self.storage_key.clone();

        tokio::task::spawn_blocking(move || kv.set(&key, &bytes))
            .await
            .map_err(|e| KVError::Storage(format!("persistence task failed: {e}")))??;

        debug!("persisted state under '{}'", self.storage_key);
        Ok(())
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
