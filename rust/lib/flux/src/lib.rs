//! Flux: hierarchical state store for Hypotenuse apps.
//!
//! One JSON tree holds all app state. Every node is addressed by a dotted
//! path; the empty path is the whole tree.
//!
//! # Three Primitives
//!
//! - `get_state(path)`: read the subtree at a path
//! - `set_state(path, value)`: overwrite the subtree, persist, notify
//! - `add_state_listener(path, include_descendants, callback)`: observe changes
//!
//! # Path Addressing
//!
//! - Runtime: `page`, `session.user`
//! - Persistent: everything under `local` (e.g. `local.settings.theme`) is
//!   written to durable storage after each write and reloaded at startup
//!
//! # Listener Matching
//!
//! Matching compares whole segments:
//! - A write at `a` notifies listeners on `a`, `a.b`, `a.b.c`, ...
//! - A write at `a.b` notifies a listener on `a` only if it was registered
//!   with `include_descendants`
//! - `a.b` and `a.bc` never match each other
//!
//! # Example
//!
//! ```ignore
//! use hypotenuse_flux::{StateStore, StoreConfig};
//!
//! let store = StateStore::initialize(config, kv, runtime, persistent)?;
//!
//! let (count, disposer) = store.get_state_and_listen_for_changes(
//!     "local.count",
//!     false,
//!     |value| async move {
//!         println!("count is now {:?}", value);
//!         Ok(())
//!     },
//! )?;
//!
//! store.set_state("local.count", json!(5)).await?;
//! disposer.dispose();
//! ```

pub mod config;
pub mod error;
pub mod listener;
pub mod path;
pub mod persistence;
pub mod store;
pub mod tree;
pub mod trie;

// Re-export primary types at crate root.
pub use config::{StoreConfig, WriteMode};
pub use error::StoreError;
pub use listener::{BoxFuture, Disposer, Listener, ListenerRegistry};
pub use path::PathKey;
pub use persistence::Persistence;
pub use store::StateStore;
pub use tree::StateTree;
