//! Key-value storage backing the chat service.
//!
//! Values are opaque strings (JSON documents in practice) keyed by string
//! names, the same contract the mobile client's async storage offers. The
//! production implementation is [`SledStore`].

use std::path::Path;

use async_trait::async_trait;
use sled::{Batch, Db};
use tracing::{debug, info};

use crate::error::{ChatStoreError, Result};

/// Storage keys for the persisted collections
pub mod keys {
    /// `Vec<Conversation>`
    pub const CONVERSATIONS: &str = "@voicechat/conversations";
    /// `map<conversation id, Vec<Message>>`
    pub const MESSAGES: &str = "@voicechat/messages";
    /// `map<message id, Vec<Reaction>>`
    pub const REACTIONS: &str = "@voicechat/reactions";
    /// `map<message id, Vec<Reply>>`
    pub const REPLIES: &str = "@voicechat/replies";

    /// Every key the chat service owns
    pub const ALL: [&str; 4] = [CONVERSATIONS, MESSAGES, REACTIONS, REPLIES];
}

/// String key-value store with an atomic multi-key write
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// Store several entries so that either all or none become visible
    async fn set_items(&self, entries: Vec<(String, String)>) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// List every key currently stored
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete everything
    async fn clear(&self) -> Result<()>;
}

/// [`KeyValueStore`] on an embedded sled database
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open (or create) a store in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = sled::open(dir)?;
        info!(path = %dir.display(), "Opened key-value store");
        Ok(Self { db })
    }

    /// Open a throwaway in-memory store, removed on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Bytes the database occupies on disk
    pub fn size_on_disk(&self) -> Result<u64> {
        Ok(self.db.size_on_disk()?)
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| ChatStoreError::Storage(format!("value for {key} is not UTF-8: {e}")))
    }
}

#[async_trait]
impl KeyValueStore for SledStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.db
            .get(key.as_bytes())?
            .map(|bytes| Self::decode(key, &bytes))
            .transpose()
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        debug!(key, bytes = value.len(), "Writing key");
        self.db.insert(key.as_bytes(), value.into_bytes())?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn set_items(&self, entries: Vec<(String, String)>) -> Result<()> {
        let mut batch = Batch::default();
        for (key, value) in &entries {
            debug!(key = %key, bytes = value.len(), "Batching key");
            batch.insert(key.as_bytes(), value.as_bytes());
        }
        self.db.apply_batch(batch)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.db
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                Self::decode("<key>", &key)
            })
            .collect()
    }

    async fn clear(&self) -> Result<()> {
        self.db.clear()?;
        self.db.flush_async().await?;
        Ok(())
    }
}
