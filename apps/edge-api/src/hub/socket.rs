//! The per-socket worker pair.
//!
//! Each registered socket runs two cooperating tasks: a writer draining the
//! connection's bounded queue onto the socket, and a reader decoding client
//! acks. Splitting the two keeps ack reception independent of outbound
//! fan-out latency in both directions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use courier_common::wire::{ClientAck, ServerFrame};
use courier_common::{SocketId, UserId};

use super::{Hub, Registration};

/// Drive an authenticated socket until it disconnects.
///
/// Registers with the hub, runs the writer in its own task and the reader
/// inline, and unregisters once the reader observes close or error.
pub async fn run(hub: Arc<Hub>, user_id: UserId, socket: WebSocket) {
    let Registration { socket_id, frames } = hub.register(user_id).await;
    tracing::info!(%socket_id, %user_id, "registered new socket");

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_frames(socket_id, frames, sink));

    read_frames(&hub, socket_id, stream).await;

    hub.unregister(socket_id).await;
    let _ = writer.await;
    tracing::info!(%socket_id, "socket closed");
}

/// Writer task: serialize and write every queued frame.
///
/// Transient write errors are logged without exiting so the queue keeps
/// draining during shutdown; only queue closure ends the task. The closing
/// handshake is sent here, which nudges a reader that is still blocked on
/// the socket after an external unregister.
async fn write_frames(
    socket_id: SocketId,
    mut frames: tokio::sync::mpsc::Receiver<ServerFrame>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(frame) = frames.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(%socket_id, %err, "unable to serialize frame");
                continue;
            }
        };

        if let Err(err) = sink.send(Message::Text(text.into())).await {
            tracing::warn!(%socket_id, %err, "error writing frame");
        }
    }

    let _ = sink.send(Message::Close(None)).await;
}

/// Reader task: decode acks until the socket closes or errors.
///
/// A frame that fails to decode is dropped without disconnecting; so is an
/// ack whose correlation id has no waiter (the sender may have timed out).
async fn read_frames(hub: &Hub, socket_id: SocketId, mut stream: SplitStream<WebSocket>) {
    while let Some(next) = stream.next().await {
        let msg = match next {
            Ok(msg) => msg,
            Err(err) => {
                tracing::debug!(%socket_id, %err, "socket read error");
                return;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => return,
            _ => continue,
        };

        match serde_json::from_str::<ClientAck>(&text) {
            Ok(ack) => {
                if let Err(err) = hub.acknowledge(&ack.cid) {
                    tracing::warn!(%socket_id, %err, "failed to acknowledge message");
                }
            }
            Err(err) => {
                tracing::warn!(%socket_id, %err, "unable to decode client frame");
            }
        }
    }
}
