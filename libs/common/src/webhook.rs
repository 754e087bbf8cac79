//! Webhook addresses: where a user's live socket can be reached.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::id::SocketId;

/// A socket location of the form `host:port/socket_id`. Published to the
/// directory when a socket registers; resolved by the fan-out path to pick
/// the node owning the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    host: String,
    socket_id: SocketId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookParseError {
    #[error("webhook must be exactly two '/'-separated parts")]
    Malformed,
    #[error("webhook socket id is not a uuid")]
    BadSocketId,
}

impl Webhook {
    pub fn new(host: impl Into<String>, socket_id: SocketId) -> Self {
        Self {
            host: host.into(),
            socket_id,
        }
    }

    /// The `host:port` where the owning node's RPC endpoint listens.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn socket_id(&self) -> SocketId {
        self.socket_id
    }
}

impl fmt::Display for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.socket_id)
    }
}

impl FromStr for Webhook {
    type Err = WebhookParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, socket) = s.split_once('/').ok_or(WebhookParseError::Malformed)?;
        if host.is_empty() || socket.contains('/') {
            return Err(WebhookParseError::Malformed);
        }
        let socket_id = socket.parse().map_err(|_| WebhookParseError::BadSocketId)?;
        Ok(Self {
            host: host.to_string(),
            socket_id,
        })
    }
}
