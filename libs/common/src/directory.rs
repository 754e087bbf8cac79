//! The shared webhook directory: user identity → live socket location.
//!
//! The directory is a soft cache with last-writer-wins semantics. It is
//! authoritative for *where to try first*, never for *is the user
//! connected* — truth about liveness stays with the hub that owns the
//! socket, and callers invalidate an entry only on strong evidence of
//! staleness. Backed by Redis in production and an in-memory map in tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;

use crate::id::UserId;

/// How long a published webhook survives without refresh. Reconnection
/// refreshes the entry well before expiry under normal traffic, and expiry
/// self-heals entries orphaned by node loss. A much shorter TTL with a
/// periodic refresher from active hubs would behave identically.
pub const WEBHOOK_TTL: Duration = Duration::from_secs(168 * 60 * 60);

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory store error: {0}")]
    Store(#[from] redis::RedisError),
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Publish `webhook` as the user's current socket location.
    async fn publish(&self, user_id: UserId, webhook: &str) -> Result<(), DirectoryError>;

    async fn lookup(&self, user_id: UserId) -> Result<Option<String>, DirectoryError>;

    /// Look up a batch of users. The result is aligned with the input so a
    /// caller can pair a stale entry back to the user it belongs to.
    async fn lookup_many(&self, user_ids: &[UserId]) -> Result<Vec<Option<String>>, DirectoryError>;

    async fn remove(&self, user_id: UserId) -> Result<(), DirectoryError>;
}

// ---------------------------------------------------------------------------
// Redis implementation
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RedisDirectory {
    conn: redis::aio::ConnectionManager,
}

impl RedisDirectory {
    /// Connect to the store at `addr` (`host:port`, scheme optional).
    /// The connection manager reconnects on its own after transient loss.
    pub async fn connect(addr: &str) -> Result<Self, DirectoryError> {
        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{addr}")
        };
        let client = redis::Client::open(url.as_str())?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Directory for RedisDirectory {
    async fn publish(&self, user_id: UserId, webhook: &str) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(user_id.to_string(), webhook, WEBHOOK_TTL.as_secs())
            .await?;
        Ok(())
    }

    async fn lookup(&self, user_id: UserId) -> Result<Option<String>, DirectoryError> {
        let mut conn = self.conn.clone();
        let webhook: Option<String> = conn.get(user_id.to_string()).await?;
        Ok(webhook)
    }

    async fn lookup_many(&self, user_ids: &[UserId]) -> Result<Vec<Option<String>>, DirectoryError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = user_ids.iter().map(ToString::to_string).collect();
        let mut conn = self.conn.clone();
        let webhooks: Vec<Option<String>> = conn.mget(&keys).await?;
        Ok(webhooks)
    }

    async fn remove(&self, user_id: UserId) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(user_id.to_string()).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (for tests)
// ---------------------------------------------------------------------------

/// Map-backed directory. TTL is not modeled; tests exercise explicit
/// publish/remove transitions.
#[derive(Default)]
pub struct MemoryDirectory {
    data: Mutex<HashMap<UserId, String>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn publish(&self, user_id: UserId, webhook: &str) -> Result<(), DirectoryError> {
        self.data
            .lock()
            .unwrap()
            .insert(user_id, webhook.to_string());
        Ok(())
    }

    async fn lookup(&self, user_id: UserId) -> Result<Option<String>, DirectoryError> {
        Ok(self.data.lock().unwrap().get(&user_id).cloned())
    }

    async fn lookup_many(&self, user_ids: &[UserId]) -> Result<Vec<Option<String>>, DirectoryError> {
        let data = self.data.lock().unwrap();
        Ok(user_ids.iter().map(|id| data.get(id).cloned()).collect())
    }

    async fn remove(&self, user_id: UserId) -> Result<(), DirectoryError> {
        self.data.lock().unwrap().remove(&user_id);
        Ok(())
    }
}
