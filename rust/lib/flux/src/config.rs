use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default durable-storage key holding the persistent segment.
pub const DEFAULT_STORAGE_KEY: &str = "mtbjorn-hypotenuse";

/// Default top-level key of the persistent segment.
pub const DEFAULT_PERSISTENT_KEY: &str = "local";

/// How concurrent `set_state` calls relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Writes interleave at their suspension points. A listener may observe
    /// a tree that is newer than the write that triggered it.
    #[default]
    Concurrent,
    /// Each write runs mutate, persist and notify before the next write
    /// starts. A listener must not await `set_state` on the same store from
    /// inside its callback in this mode, or it waits on itself.
    Serialized,
}

/// State store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Key under which the persistent segment is stored.
    pub storage_key: String,

    /// Top-level state key whose subtree is persisted.
    pub persistent_key: String,

    pub write_mode: WriteMode,

    /// Path to the redb database file used by hosts that persist to disk.
    /// Defaults to `hypotenuse.redb` in the working directory.
    pub db_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persistent_key: DEFAULT_PERSISTENT_KEY.to_string(),
            write_mode: WriteMode::Concurrent,
            db_path: None,
        }
    }
}

impl StoreConfig {
    /// Resolve the redb database path, falling back to `hypotenuse.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("hypotenuse.redb"))
    }
}
