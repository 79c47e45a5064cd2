//! Conversation record storage.
//!
//! Every conversation owns exactly one record, keyed by its conversation id.
//! Backends only move opaque bytes; [`Conversations`] layers JSON encoding of a
//! typed record on top so callers never touch raw keys or values.
//!
//! Two backends are provided: [`MemoryStore`] for tests and single-process
//! hosts, and [`RedbStore`] for records that must survive a restart.

pub mod memory;
pub mod redb;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Key prefix under which conversation records are stored.
pub const CONVERSATION_PREFIX: &str = "conversation:";

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: record for conversation {conversation_id} is corrupt: {source}")]
    Corrupt {
        conversation_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store: encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("store: invalid conversation id {0:?}")]
    InvalidId(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Byte-level storage of conversation records.
pub trait ConversationStore: Send + Sync {
    /// Returns the stored record for a conversation, if any.
    fn load_raw(&self, conversation_id: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the stored record for a conversation.
    fn save_raw(&self, conversation_id: &str, record: &[u8]) -> StoreResult<()>;

    /// Drops the record for a conversation. Missing records are not an error.
    fn delete(&self, conversation_id: &str) -> StoreResult<()>;

    /// Lists the ids of all stored conversations in ascending order.
    fn conversations(&self) -> StoreResult<Vec<String>>;
}

impl fmt::Debug for dyn ConversationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversationStore {{ ... }}")
    }
}

pub(crate) fn record_key(conversation_id: &str) -> StoreResult<String> {
    if conversation_id.trim().is_empty() {
        return Err(StoreError::InvalidId(conversation_id.to_string()));
    }
    Ok(format!("{}{}", CONVERSATION_PREFIX, conversation_id))
}

/// Typed view over a [`ConversationStore`].
pub struct Conversations<T> {
    inner: Arc<dyn ConversationStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Conversations<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> Conversations<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(inner: Arc<dyn ConversationStore>) -> Self {
        Self {
            inner,
            _record: PhantomData,
        }
    }

    /// Loads and decodes the record for a conversation.
    pub fn load(&self, conversation_id: &str) -> StoreResult<Option<T>> {
        match self.inner.load_raw(conversation_id)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    conversation_id: conversation_id.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Loads the record for a conversation, falling back to `T::default()`.
    pub fn load_or_default(&self, conversation_id: &str) -> StoreResult<T>
    where
        T: Default,
    {
        Ok(self.load(conversation_id)?.unwrap_or_default())
    }

    /// Encodes and stores the record for a conversation.
    pub fn save(&self, conversation_id: &str, record: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(record).map_err(StoreError::Encode)?;
        self.inner.save_raw(conversation_id, &bytes)
    }

    /// Removes the record for a conversation.
    pub fn delete(&self, conversation_id: &str) -> StoreResult<()> {
        self.inner.delete(conversation_id)
    }

    /// Lists stored conversation ids.
    pub fn ids(&self) -> StoreResult<Vec<String>> {
        self.inner.conversations()
    }
}

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: Option<String>,
        turns: u32,
    }

    #[test]
    fn test_typed_roundtrip() {
        let store: Conversations<Record> = Conversations::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load("c1").unwrap(), None);

        let rec = Record {
            name: Some("Loek".into()),
            turns: 3,
        };
        store.save("c1", &rec).unwrap();
        assert_eq!(store.load("c1").unwrap(), Some(rec));
        assert_eq!(store.ids().unwrap(), vec!["c1".to_string()]);

        store.delete("c1").unwrap();
        assert_eq!(store.load_or_default("c1").unwrap(), Record::default());
    }

    #[test]
    fn test_corrupt_record() {
        let raw = Arc::new(MemoryStore::new());
        raw.save_raw("c1", b"{not json").unwrap();

        let store: Conversations<Record> = Conversations::new(raw);
        let err = store.load("c1").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref conversation_id, .. } if conversation_id == "c1"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(store.save_raw("  ", b"{}"), Err(StoreError::InvalidId(_))));
    }
}
