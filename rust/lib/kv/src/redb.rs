use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("hypotenuse");

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database. Every `set` commits its own write transaction, so a
/// successful return means the bytes are durable.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(KVError::storage)?;

        // Ensure the table exists so first reads do not fail.
        let write_txn = db.begin_write().map_err(KVError::storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(KVError::storage)?;
        }
        write_txn.commit().map_err(KVError::storage)?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(KVError::storage)?;
        let table = read_txn.open_table(TABLE).map_err(KVError::storage)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(KVError::storage(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(KVError::storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(KVError::storage)?;
            table.insert(key, value).map_err(KVError::storage)?;
        }
        write_txn.commit().map_err(KVError::storage)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(KVError::storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(KVError::storage)?;
            table.remove(key).map_err(KVError::storage)?;
        }
        write_txn.commit().map_err(KVError::storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_delete() {
        let tmp = TempDir::new().unwrap();
        let store = RedbStore::open(&tmp.path().join("kv.redb")).unwrap();

        assert_eq!(store.get("snapshot").unwrap(), None);
        store.set("snapshot", br#"{"count":1}"#).unwrap();
        assert_eq!(
            store.get("snapshot").unwrap().as_deref(),
            Some(&br#"{"count":1}"#[..])
        );

        store.delete("snapshot").unwrap();
        assert_eq!(store.get("snapshot").unwrap(), None);
    }

    #[test]
    fn delete_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let store = RedbStore::open(&tmp.path().join("kv.redb")).unwrap();
        store.delete("never-written").unwrap();
    }

    #[test]
    fn values_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kv.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("snapshot", b"persisted").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(
            store.get("snapshot").unwrap().as_deref(),
            Some(&b"persisted"[..])
        );
    }
}
