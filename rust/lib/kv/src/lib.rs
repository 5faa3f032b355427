//! Durable key-value storage behind the state store's persistent segment.
//!
//! The store only ever needs a handful of string keys holding serialized
//! snapshots, so the interface is a plain byte-oriented [`KVStore`] with two
//! backends: [`RedbStore`] on disk and [`MemoryStore`] in process.

pub mod error;
pub mod memory;
pub mod redb;
pub mod traits;

pub use error::KVError;
pub use memory::MemoryStore;
pub use redb::RedbStore;
pub use traits::KVStore;
