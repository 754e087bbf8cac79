//! In-memory store, used by tests and single-node development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_common::RoomId;

use super::{ChatStore, MessageRecord, Room, StoreError};

/// Map-backed [`ChatStore`]. Not durable: the production deployment binds
/// the relational store here instead.
#[derive(Default)]
pub struct MemoryStore {
    rooms: Mutex<HashMap<RoomId, Room>>,
    messages: Mutex<Vec<MessageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a room. Room management lives outside the delivery core.
    pub fn insert_room(&self, room: Room) {
        self.rooms.lock().unwrap().insert(room.id, room);
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn room_by_id(&self, room_id: RoomId) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.lock().unwrap().get(&room_id).cloned())
    }

    async fn append_message(&self, record: &MessageRecord) -> Result<(), StoreError> {
        self.messages.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn messages_between(
        &self,
        room_id: RoomId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let mut messages: Vec<MessageRecord> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.room_id == room_id && m.timestamp > from && m.timestamp < to)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(messages)
    }
}
