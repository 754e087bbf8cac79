use thiserror::Error;

/// Errors surfaced by the hub's delivery operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// No registered connection under the requested socket id.
    #[error("socket not found")]
    SocketNotFound,

    /// The socket's write queue is saturated. Callers treat this as a
    /// transient delivery miss and do not retry in the realtime path.
    #[error("write buffer full")]
    BufferFull,

    /// The client did not acknowledge within the ack window.
    #[error("timed out waiting for acknowledgment")]
    AckTimeout,

    /// The ack wait ended without an ack or a timeout, e.g. the hub shut
    /// down underneath the waiter.
    #[error("acknowledgment wait cancelled")]
    Cancelled,

    /// An ack arrived for a correlation id with no registered waiter.
    #[error("no in-flight delivery for cid {0}")]
    UnknownCid(String),
}
