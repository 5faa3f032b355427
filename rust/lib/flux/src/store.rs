use std::future::Future;
use std::sync::{Arc, RwLock};

use hypotenuse_kv::KVStore;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{StoreConfig, WriteMode};
use crate::error::{Result, StoreError};
use crate::listener::{Disposer, ListenerRegistry};
use crate::path::PathKey;
use crate::persistence::Persistence;
use crate::tree::{self, StateTree};

/// Hierarchical state store with persistence and change listeners.
///
/// - `get_state(path)` reads the subtree at a dotted path.
/// - `set_state(path, value)` writes, persists the persistent segment, then
///   notifies every affected listener.
/// - `add_state_listener(path, include_descendants, callback)` subscribes.
/// - `get_state_and_listen_for_changes(..)` subscribes and reads in one step.
///
/// One top-level key (`local` by default) is the persistent segment. It is
/// mirrored to the [`KVStore`] after every write; everything else lives only
/// in memory.
pub struct StateStore {
    config: StoreConfig,
    tree: RwLock<StateTree>,
    persistence: Persistence,
    listeners: Arc<ListenerRegistry>,
    /// Held for the duration of a write in `WriteMode::Serialized`.
    write_gate: tokio::sync::Mutex<()>,
}

impl StateStore {
    /// Build a store, loading the persistent segment from `kv`.
    ///
    /// The initial tree is `initial_runtime` with the persistent key set to
    /// the loaded segment overlaid with `initial_persistent`. Storage read
    /// failures are returned, never ignored.
    pub fn initialize(
        config: StoreConfig,
        kv: Arc<dyn KVStore>,
        initial_runtime: StateTree,
        initial_persistent: StateTree,
    ) -> Result<Arc<Self>> {
        let persistence = Persistence::new(kv, config.storage_key.clone());
        let tree = Self::initial_tree(&config, &persistence, initial_runtime, initial_persistent)?;
        info!(
            "state store initialized (storage key '{}', persistent key '{}', {:?} writes)",
            config.storage_key, config.persistent_key, config.write_mode
        );

        Ok(Arc::new(Self {
            config,
            tree: RwLock::new(tree),
            persistence,
            listeners: Arc::new(ListenerRegistry::new()),
            write_gate: tokio::sync::Mutex::new(()),
        }))
    }

    /// Reset the tree to a freshly loaded state.
    ///
    /// Registered listeners are kept and are not notified.
    pub fn reinitialize(&self, initial_runtime: StateTree, initial_persistent: StateTree) -> Result<()> {
        let fresh = Self::initial_tree(&self.config, &self.persistence, initial_runtime, initial_persistent)?;
        *self.tree.write().unwrap() = fresh;
        debug!("state store reinitialized");
        Ok(())
    }

    fn initial_tree(
        config: &StoreConfig,
        persistence: &Persistence,
        initial_runtime: StateTree,
        initial_persistent: StateTree,
    ) -> Result<StateTree> {
        let persistent = persistence.load(initial_persistent)?;
        let mut tree = initial_runtime;
        tree.insert(config.persistent_key.clone(), Value::Object(persistent));
        Ok(tree)
    }

    // ====================================================================
    // State: read
    // ====================================================================

    /// Read the value at a dotted path. `""` reads the whole tree.
    ///
    /// Pure: missing intermediate nodes are not created.
    pub fn get_state(&self, path: &str) -> Result<Option<Value>> {
        let path = PathKey::parse(path)?;
        Ok(self.read(&path))
    }

    fn read(&self, path: &PathKey) -> Option<Value> {
        let tree = self.tree.read().unwrap();
        tree::read(&tree, path)
    }

    /// Snapshot of the persistent segment.
    pub fn persistent_segment(&self) -> StateTree {
        let tree = self.tree.read().unwrap();
        self.persistent_snapshot(&tree)
    }

    fn persistent_snapshot(&self, tree: &StateTree) -> StateTree {
        match tree.get(&self.config.persistent_key) {
            Some(Value::Object(map)) => map.clone(),
            _ => StateTree::new(),
        }
    }

    // ====================================================================
    // State: write
    // ====================================================================

    /// Write `value` at a dotted path, overwriting the subtree there.
    ///
    /// Runs three steps in order: mutate the tree, persist the persistent
    /// segment, notify listeners. Notification starts only after the
    /// segment is durably written, so listeners never observe state that
    /// storage does not have.
    ///
    /// A persistence failure is returned before any listener runs. Listener
    /// failures are collected and returned after all listeners settled.
    pub async fn set_state(&self, path: &str, value: Value) -> Result<()> {
        let path = PathKey::parse(path)?;
        self.check_persistent_segment(&path, &value)?;

        let _gate = match self.config.write_mode {
            WriteMode::Serialized => Some(self.write_gate.lock().await),
            WriteMode::Concurrent => None,
        };

        {
            let mut tree = self.tree.write().unwrap();
            tree::write(&mut tree, &path, value)?;
        }
        debug!("state written at '{}'", path);

        self.persistence
            .save_latest(|| self.persistent_segment())
            .await?;
        self.listeners.notify(&path, |p| self.read(p)).await
    }

    /// The persistent segment must stay a mapping, whichever way it is written.
    fn check_persistent_segment(&self, path: &PathKey, value: &Value) -> Result<()> {
        let key = &self.config.persistent_key;
        let replaced = match path.segments() {
            [] => value.get(key),
            [only] if only == key => Some(value),
            _ => None,
        };
        match replaced {
            Some(v) if !v.is_object() => Err(StoreError::PersistentSegmentNotMapping(key.clone())),
            _ => Ok(()),
        }
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Subscribe to changes at `path`.
    ///
    /// The callback fires when a write lands at `path` or any ancestor of
    /// it, and also for writes below `path` when `include_descendants` is
    /// set. It receives the fresh value at `path` itself.
    ///
    /// Fails synchronously, before any state is touched, if `path` is not a
    /// valid path key.
    pub fn add_state_listener<F, Fut>(&self, path: &str, include_descendants: bool, callback: F) -> Result<Disposer>
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let path = PathKey::parse(path)?;
        Ok(self.listeners.add(path, include_descendants, callback))
    }

    /// Subscribe and return the current value alongside the disposer.
    ///
    /// The listener is registered before the read, so no write can fall
    /// between the two unobserved.
    pub fn get_state_and_listen_for_changes<F, Fut>(
        &self,
        path: &str,
        include_descendants: bool,
        callback: F,
    ) -> Result<(Option<Value>, Disposer)>
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let key = PathKey::parse(path)?;
        let disposer = self.listeners.add(key.clone(), include_descendants, callback);
        Ok((self.read(&key), disposer))
    }

    /// Total number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
