use hypotenuse_kv::KVError;
use thiserror::Error;

/// Errors surfaced by the state store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The path key could not be parsed (e.g. `"a..b"`).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A write tried to descend through a value that is not a mapping.
    #[error("cannot write '{path}': '{prefix}' holds a non-mapping value")]
    StructuralConflict { path: String, prefix: String },

    /// Whole-tree writes must supply a mapping.
    #[error("the state root must be a mapping")]
    RootNotMapping,

    /// The persistent segment must always remain a mapping.
    #[error("persistent segment '{0}' must hold a mapping")]
    PersistentSegmentNotMapping(String),

    /// Durable storage could not be read or written. Memory and storage may
    /// have diverged.
    #[error("persistence failed: {0}")]
    Persistence(#[from] KVError),

    /// One or more listeners failed. Every matched listener still ran.
    #[error("{failed} of {total} state listeners failed; first failure at '{path}': {source}")]
    Listeners {
        failed: usize,
        total: usize,
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
