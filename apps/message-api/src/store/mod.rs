//! Persistence contracts the delivery core consumes.
//!
//! The durable relational store is an external collaborator: the core only
//! needs a room's member set, an append into the message log, and the
//! history read-back that makes the log the realtime path's retry
//! mechanism.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use courier_common::{RoomId, UserId};

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A chat room and its member set.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub members: Vec<UserId>,
}

/// One entry of the durable message log.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub room_id: RoomId,
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = String)]
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch a room and its members — the fan-out path's `members_of`.
    async fn room_by_id(&self, room_id: RoomId) -> Result<Option<Room>, StoreError>;

    /// Append a message to the durable log.
    async fn append_message(&self, record: &MessageRecord) -> Result<(), StoreError>;

    /// Messages in `room_id` with `from < timestamp < to`, newest first.
    async fn messages_between(
        &self,
        room_id: RoomId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>, StoreError>;
}
