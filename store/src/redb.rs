//! Redb-backed persistent conversation store.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{record_key, ConversationStore, StoreError, StoreResult, CONVERSATION_PREFIX};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("conversations");

fn storage<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Storage(e.to_string())
}

/// A conversation store persisted in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Opens or creates the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        let tx = db.begin_write().map_err(storage)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        Ok(Self { db })
    }
}

impl ConversationStore for RedbStore {
    fn load_raw(&self, conversation_id: &str) -> StoreResult<Option<Vec<u8>>> {
        let key = record_key(conversation_id)?;
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;
        Ok(table
            .get(key.as_str())
            .map_err(storage)?
            .map(|value| value.value().to_vec()))
    }

    fn save_raw(&self, conversation_id: &str, record: &[u8]) -> StoreResult<()> {
        let key = record_key(conversation_id)?;
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            table.insert(key.as_str(), record).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn delete(&self, conversation_id: &str) -> StoreResult<()> {
        let key = record_key(conversation_id)?;
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            table.remove(key.as_str()).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn conversations(&self) -> StoreResult<Vec<String>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;

        let mut ids = Vec::new();
        for item in table.iter().map_err(storage)? {
            let (key, _) = item.map_err(storage)?;
            if let Some(id) = key.value().strip_prefix(CONVERSATION_PREFIX) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_redb_basic() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("habot.redb")).unwrap();

        store.save_raw("conv-1", b"{\"turns\":1}").unwrap();
        assert_eq!(
            store.load_raw("conv-1").unwrap(),
            Some(b"{\"turns\":1}".to_vec())
        );

        store.delete("conv-1").unwrap();
        assert_eq!(store.load_raw("conv-1").unwrap(), None);
    }

    #[test]
    fn test_redb_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("habot.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.save_raw("b", b"2").unwrap();
            store.save_raw("a", b"1").unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.conversations().unwrap(), vec!["a", "b"]);
        assert_eq!(store.load_raw("a").unwrap(), Some(b"1".to_vec()));
    }
}
