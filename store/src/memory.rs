//! In-memory conversation store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::{record_key, ConversationStore, StoreError, StoreResult, CONVERSATION_PREFIX};

/// A conversation store backed by an ordered map. Records live as long as the
/// process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn load_raw(&self, conversation_id: &str) -> StoreResult<Option<Vec<u8>>> {
        let key = record_key(conversation_id)?;
        let data = self
            .data
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.get(&key).cloned())
    }

    fn save_raw(&self, conversation_id: &str, record: &[u8]) -> StoreResult<()> {
        let key = record_key(conversation_id)?;
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.insert(key, record.to_vec());
        Ok(())
    }

    fn delete(&self, conversation_id: &str) -> StoreResult<()> {
        let key = record_key(conversation_id)?;
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.remove(&key);
        Ok(())
    }

    fn conversations(&self) -> StoreResult<Vec<String>> {
        let data = self
            .data
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data
            .keys()
            .filter_map(|k| k.strip_prefix(CONVERSATION_PREFIX))
            .map(str::to_string)
            .collect())
    }
}
