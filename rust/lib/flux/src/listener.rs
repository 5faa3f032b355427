use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::path::PathKey;
use crate::trie::Trie;

/// A boxed, `Send`-able future returned by listener callbacks.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Type-erased listener callback.
///
/// Receives the current value at the listener's own path (`None` if the
/// path holds nothing).
pub type Listener = Arc<dyn Fn(Option<Value>) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

#[derive(Clone)]
struct ListenerEntry {
    id: Uuid,
    path: PathKey,
    include_descendants: bool,
    callback: Listener,
}

/// True when a write at `changed` should notify a subscription on `path`.
///
/// A write at or above the subscription always notifies it. A write below
/// it notifies only if the subscription includes descendants.
pub fn matches(changed: &PathKey, path: &PathKey, include_descendants: bool) -> bool {
    changed.is_ancestor_or_equal(path) || (include_descendants && path.is_ancestor_or_equal(changed))
}

/// Registry of state listeners, indexed by path segment.
///
/// Subscriptions live until their [`Disposer`] is called; nothing expires
/// on its own.
pub struct ListenerRegistry {
    trie: Trie<ListenerEntry>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    /// Register a listener at `path` and return its disposer.
    pub fn add<F, Fut>(self: &Arc<Self>, path: PathKey, include_descendants: bool, callback: F) -> Disposer
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: Listener =
            Arc::new(move |value: Option<Value>| -> BoxFuture<anyhow::Result<()>> {
                Box::pin(callback(value))
            });
        let id = Uuid::new_v4();
        self.trie.insert(
            &path,
            ListenerEntry {
                id,
                path: path.clone(),
                include_descendants,
                callback,
            },
        );
        debug!("state listener {} added at '{}'", id, path);

        Disposer {
            registry: Arc::downgrade(self),
            path,
            id,
            disposed: AtomicBool::new(false),
        }
    }

    /// Listeners affected by a write at `changed`.
    fn affected(&self, changed: &PathKey) -> Vec<ListenerEntry> {
        let mut entries: Vec<ListenerEntry> = self
            .trie
            .ancestors_of(changed)
            .into_iter()
            .filter(|entry| entry.include_descendants)
            .collect();
        entries.extend(self.trie.subtree_of(changed));
        entries
    }

    /// Invoke every listener affected by a write at `changed`.
    ///
    /// Each listener receives `read(own_path)`, not the changed value. All
    /// listeners run concurrently and all are awaited, even if some fail;
    /// failures are then reported together.
    pub async fn notify<R>(&self, changed: &PathKey, read: R) -> Result<(), StoreError>
    where
        R: Fn(&PathKey) -> Option<Value>,
    {
        let entries = self.affected(changed);
        let total = entries.len();
        if total == 0 {
            return Ok(());
        }

        let tasks = entries.into_iter().map(|entry| {
            let value = read(&entry.path);
            debug!("Executing state listener for key '{}'", entry.path);
            let call = (entry.callback)(value);
            async move { (entry.path, call.await) }
        });

        let failures: Vec<(PathKey, anyhow::Error)> = join_all(tasks)
            .await
            .into_iter()
            .filter_map(|(path, result)| result.err().map(|e| (path, e)))
            .collect();

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some((path, source)) => {
                warn!("{} of {} state listeners failed after write to '{}'", failed, total, changed);
                Err(StoreError::Listeners {
                    failed,
                    total,
                    path: path.to_dotted(),
                    source: source.into(),
                })
            }
        }
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    fn remove(&self, path: &PathKey, id: Uuid) -> bool {
        self.trie.remove(path, |entry| entry.id == id)
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a subscription when called. Calling it again is a no-op.
///
/// Dropping a `Disposer` without calling [`Disposer::dispose`] leaves the
/// subscription registered.
pub struct Disposer {
    registry: Weak<ListenerRegistry>,
    path: PathKey,
    id: Uuid,
    disposed: AtomicBool,
}

impl Disposer {
    /// Permanently remove the subscription.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(&self.path, self.id) {
                debug!("state listener {} removed from '{}'", self.id, self.path);
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// The path this subscription listens on.
    pub fn path(&self) -> &PathKey {
        &self.path
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
