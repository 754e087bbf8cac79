//! The canonical fan-out payload: what every recipient of a message sees.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{RoomId, UserId};

/// Encoded once at persist time and delivered verbatim to every recipient;
/// the same bytes are the REST response body for the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub room_id: String,
    pub user_id: String,
    pub timestamp: String,
    pub content: String,
}

impl MessagePayload {
    /// Build the payload for a message persisted at `timestamp`. The
    /// timestamp is rendered RFC3339 with nanoseconds and stored verbatim.
    pub fn new(
        room_id: RoomId,
        user_id: UserId,
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            content: content.into(),
        }
    }

    /// Canonical JSON encoding.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
