//! JSON frames exchanged with clients over the websocket.
//!
//! Three shapes cross the wire edge: a delivery wrapping opaque payload
//! bytes, the client's acknowledgment, and the registration greeting that
//! tells a client where its socket lives. Everything is UTF-8 JSON sent as
//! text frames.

use serde::{Deserialize, Serialize};

/// Serde adapter encoding payload bytes as standard base64, the JSON
/// convention for opaque byte strings.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// A delivery pushed to a client. The payload is opaque to the edge node;
/// `cid` correlates the client's acknowledgment with the in-flight wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub cid: String,
    pub acknowledge: bool,
}

/// Acknowledgment echoed by a client for a delivery that requested one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAck {
    pub cid: String,
}

/// Registration greeting carrying the webhook under which the new socket is
/// reachable from other nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub webhook: String,
}

/// The closed set of server→client frames. Serialized untagged: each shape
/// is distinguishable by its fields, and clients match on what they find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Delivery(ClientMessage),
    WhoAmI(WhoAmIResponse),
}
