use crate::error::KVError;

/// KVStore is the durable storage seam used by the state store.
///
/// Keys are opaque strings (the state store uses a single key holding the
/// JSON snapshot of its persistent segment). Values are raw bytes.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;
}
