//! The per-node socket registry and delivery coordinator.
//!
//! The hub owns every live connection on this node and implements reliable
//! delivery: each `send_message` wraps the payload with a fresh correlation
//! id and blocks until the client echoes it back or the ack window closes.
//!
//! Two sharded maps back the hub: `conns` (socket id → connection) and
//! `inflight` (correlation id → waiter). They are kept separate so the
//! dispatch and ack paths never couple on a lock, and no I/O ever happens
//! while a map guard is held.

pub mod socket;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use uuid::Uuid;

use courier_common::directory::Directory;
use courier_common::wire::{ClientMessage, ServerFrame, WhoAmIResponse};
use courier_common::{SocketId, UserId, Webhook};

use crate::error::HubError;

/// Bound on a connection's pending writes. A full queue is a backpressure
/// signal: `send_message` fails fast instead of blocking the hub.
pub const WRITE_QUEUE_CAPACITY: usize = 64;

/// How long a delivery waits for the client's acknowledgment.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// A registered socket's hub-side half: the owning user and the bounded
/// write queue consumed by the socket's writer task.
struct Connection {
    user_id: UserId,
    writes: mpsc::Sender<ServerFrame>,
}

/// Handed back by [`Hub::register`]: the fresh socket id and the receiving
/// end of the write queue, which the socket's writer task drains.
pub struct Registration {
    pub socket_id: SocketId,
    pub frames: mpsc::Receiver<ServerFrame>,
}

pub struct Hub {
    hostname: String,
    directory: Arc<dyn Directory>,
    conns: DashMap<SocketId, Connection>,
    inflight: DashMap<Uuid, oneshot::Sender<()>>,
}

/// Removes the in-flight entry when the `send_message` future completes or
/// is dropped, so a cancelled wait can never leak a waiter.
struct InFlightGuard<'a> {
    hub: &'a Hub,
    cid: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.hub.inflight.remove(&self.cid);
    }
}

impl Hub {
    pub fn new(hostname: impl Into<String>, directory: Arc<dyn Directory>) -> Self {
        Self {
            hostname: hostname.into(),
            directory,
            conns: DashMap::new(),
            inflight: DashMap::new(),
        }
    }

    /// Register a connection for `user_id`: mint a socket id, create the
    /// bounded write queue, greet the client with its webhook, and publish
    /// the webhook to the directory.
    ///
    /// A publish failure is logged but does not fail registration — the
    /// directory is a soft cache and the next reconnect refreshes it.
    pub async fn register(&self, user_id: UserId) -> Registration {
        let socket_id = SocketId::new();
        let (writes, frames) = mpsc::channel(WRITE_QUEUE_CAPACITY);

        self.conns.insert(socket_id, Connection { user_id, writes });

        let webhook = Webhook::new(&self.hostname, socket_id);

        // Tell the client where its socket lives before anything else can
        // be enqueued; the queue is fresh so this cannot fail.
        if let Err(err) = self.unsafe_send(
            socket_id,
            ServerFrame::WhoAmI(WhoAmIResponse {
                webhook: webhook.to_string(),
            }),
        ) {
            tracing::error!(%err, %socket_id, "unable to greet socket");
        }

        if let Err(err) = self.directory.publish(user_id, &webhook.to_string()).await {
            tracing::error!(%err, %user_id, %socket_id, "unable to publish webhook");
        }

        Registration { socket_id, frames }
    }

    /// Remove the connection and its directory entry. Idempotent: a second
    /// call for the same socket id is a no-op.
    ///
    /// Dropping the connection closes the write queue, which is what makes
    /// the socket's writer task exit.
    pub async fn unregister(&self, socket_id: SocketId) {
        let Some((_, conn)) = self.conns.remove(&socket_id) else {
            return;
        };

        if let Err(err) = self.directory.remove(conn.user_id).await {
            tracing::error!(%err, user_id = %conn.user_id, %socket_id, "unable to remove webhook");
        }
    }

    /// Enqueue a frame without waiting for the client to receive it.
    ///
    /// Non-blocking: a saturated queue fails with [`HubError::BufferFull`]
    /// and the caller decides whether the miss matters.
    pub fn unsafe_send(&self, socket_id: SocketId, frame: ServerFrame) -> Result<(), HubError> {
        let conn = self
            .conns
            .get(&socket_id)
            .ok_or(HubError::SocketNotFound)?;

        match conn.writes.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(HubError::BufferFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(HubError::SocketNotFound),
        }
    }

    /// Deliver `payload` to the socket and wait for the client's ack.
    ///
    /// The wait is bounded by [`ACK_TIMEOUT`]; callers with a shorter
    /// deadline wrap this future in `tokio::time::timeout`, and dropping
    /// it cleans up the in-flight entry.
    pub async fn send_message(&self, socket_id: SocketId, payload: Vec<u8>) -> Result<(), HubError> {
        let cid = Uuid::new_v4();
        let (notify, acked) = oneshot::channel();

        self.inflight.insert(cid, notify);
        let _guard = InFlightGuard { hub: self, cid };

        self.unsafe_send(
            socket_id,
            ServerFrame::Delivery(ClientMessage {
                payload,
                cid: cid.to_string(),
                acknowledge: true,
            }),
        )?;

        match time::timeout(ACK_TIMEOUT, acked).await {
            Ok(Ok(())) => {
                tracing::debug!(%cid, %socket_id, "received ack");
                Ok(())
            }
            Ok(Err(_)) => Err(HubError::Cancelled),
            Err(_) => {
                tracing::warn!(%cid, %socket_id, "timed out waiting for client acknowledgment");
                Err(HubError::AckTimeout)
            }
        }
    }

    /// Wake the waiter registered under `cid`. Called by socket readers
    /// when a client echoes a correlation id back.
    ///
    /// The waiter is notified through a one-shot sender after the map
    /// entry is released, so the wake can never block under the lock.
    pub fn acknowledge(&self, cid: &str) -> Result<(), HubError> {
        let parsed: Uuid = cid
            .parse()
            .map_err(|_| HubError::UnknownCid(cid.to_string()))?;

        let (_, notify) = self
            .inflight
            .remove(&parsed)
            .ok_or_else(|| HubError::UnknownCid(cid.to_string()))?;

        // The waiter may have timed out between the remove and this send;
        // it cleaned up after itself, so a failed send is fine.
        let _ = notify.send(());
        Ok(())
    }

    /// Unregister every connection. Run before dropping the hub so each
    /// socket's directory entry is cleaned up and each writer drains out.
    pub async fn shutdown(&self) {
        let socket_ids: Vec<SocketId> = self.conns.iter().map(|entry| *entry.key()).collect();
        for socket_id in socket_ids {
            self.unregister(socket_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use courier_common::directory::MemoryDirectory;

    use super::*;

    fn test_hub() -> (Arc<Hub>, Arc<MemoryDirectory>) {
        let directory = Arc::new(MemoryDirectory::new());
        let hub = Arc::new(Hub::new("edge-test:8081", directory.clone()));
        (hub, directory)
    }

    /// Register and pop the greeting frame so tests start from an empty
    /// write queue.
    async fn register_drained(hub: &Hub, user_id: UserId) -> Registration {
        let mut registration = hub.register(user_id).await;
        let greeting = registration.frames.recv().await.expect("greeting frame");
        assert!(matches!(greeting, ServerFrame::WhoAmI(_)));
        registration
    }

    fn delivery_payload(frame: ServerFrame) -> ClientMessage {
        match frame {
            ServerFrame::Delivery(msg) => msg,
            other => panic!("expected delivery frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_publishes_webhook_and_greets() {
        let (hub, directory) = test_hub();
        let user = UserId::new();

        let mut registration = hub.register(user).await;
        let expected = format!("edge-test:8081/{}", registration.socket_id);

        match registration.frames.recv().await.unwrap() {
            ServerFrame::WhoAmI(whoami) => assert_eq!(whoami.webhook, expected),
            other => panic!("expected whoami, got {other:?}"),
        }

        assert_eq!(directory.lookup(user).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn unregister_removes_registry_and_directory() {
        let (hub, directory) = test_hub();
        let user = UserId::new();
        let registration = register_drained(&hub, user).await;

        hub.unregister(registration.socket_id).await;
        assert!(hub.conns.is_empty());
        assert_eq!(directory.lookup(user).await.unwrap(), None);

        assert_eq!(
            hub.unsafe_send(
                registration.socket_id,
                ServerFrame::WhoAmI(WhoAmIResponse {
                    webhook: String::new()
                })
            ),
            Err(HubError::SocketNotFound)
        );

        // Second unregister is a no-op.
        hub.unregister(registration.socket_id).await;
    }

    #[tokio::test]
    async fn send_message_resolves_on_ack() {
        let (hub, _) = test_hub();
        let registration = register_drained(&hub, UserId::new()).await;
        let mut frames = registration.frames;

        let acker = tokio::spawn({
            let hub = hub.clone();
            async move {
                let msg = delivery_payload(frames.recv().await.unwrap());
                assert!(msg.acknowledge);
                assert_eq!(msg.payload, b"hello");
                hub.acknowledge(&msg.cid).unwrap();
            }
        });

        hub.send_message(registration.socket_id, b"hello".to_vec())
            .await
            .unwrap();

        assert!(hub.inflight.is_empty());
        acker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn send_message_times_out_without_ack() {
        let (hub, _) = test_hub();
        let registration = register_drained(&hub, UserId::new()).await;

        let result = hub
            .send_message(registration.socket_id, b"silence".to_vec())
            .await;

        assert_eq!(result, Err(HubError::AckTimeout));
        assert!(hub.inflight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_send_cleans_up_in_flight_entry() {
        let (hub, _) = test_hub();
        let registration = register_drained(&hub, UserId::new()).await;

        let result = time::timeout(
            Duration::from_secs(1),
            hub.send_message(registration.socket_id, b"dropped".to_vec()),
        )
        .await;

        assert!(result.is_err());
        assert!(hub.inflight.is_empty());
    }

    #[tokio::test]
    async fn send_message_to_unknown_socket() {
        let (hub, _) = test_hub();
        let result = hub.send_message(SocketId::new(), b"nope".to_vec()).await;
        assert_eq!(result, Err(HubError::SocketNotFound));
        assert!(hub.inflight.is_empty());
    }

    #[tokio::test]
    async fn write_queue_rejects_the_65th_enqueue() {
        let (hub, _) = test_hub();
        let registration = register_drained(&hub, UserId::new()).await;

        for i in 0..WRITE_QUEUE_CAPACITY {
            hub.unsafe_send(
                registration.socket_id,
                ServerFrame::Delivery(ClientMessage {
                    payload: vec![i as u8],
                    cid: Uuid::new_v4().to_string(),
                    acknowledge: false,
                }),
            )
            .unwrap_or_else(|err| panic!("enqueue {i} failed: {err}"));
        }

        let overflow = hub.unsafe_send(
            registration.socket_id,
            ServerFrame::Delivery(ClientMessage {
                payload: b"overflow".to_vec(),
                cid: Uuid::new_v4().to_string(),
                acknowledge: false,
            }),
        );
        assert_eq!(overflow, Err(HubError::BufferFull));

        // A saturated queue also fails the ack path fast.
        let result = hub
            .send_message(registration.socket_id, b"full".to_vec())
            .await;
        assert_eq!(result, Err(HubError::BufferFull));
        assert!(hub.inflight.is_empty());
    }

    #[tokio::test]
    async fn frames_drain_in_enqueue_order() {
        let (hub, _) = test_hub();
        let mut registration = register_drained(&hub, UserId::new()).await;

        for i in 0u8..5 {
            hub.unsafe_send(
                registration.socket_id,
                ServerFrame::Delivery(ClientMessage {
                    payload: vec![i],
                    cid: Uuid::new_v4().to_string(),
                    acknowledge: false,
                }),
            )
            .unwrap();
        }

        for i in 0u8..5 {
            let msg = delivery_payload(registration.frames.recv().await.unwrap());
            assert_eq!(msg.payload, vec![i]);
        }
    }

    #[tokio::test]
    async fn acknowledge_unknown_cid_is_categorizable() {
        let (hub, _) = test_hub();

        let missing = Uuid::new_v4().to_string();
        assert_eq!(
            hub.acknowledge(&missing),
            Err(HubError::UnknownCid(missing.clone()))
        );

        assert!(matches!(
            hub.acknowledge("not-a-uuid"),
            Err(HubError::UnknownCid(_))
        ));
        assert!(hub.inflight.is_empty());
    }

    #[tokio::test]
    async fn shutdown_unregisters_everything() {
        let (hub, directory) = test_hub();
        let alice = UserId::new();
        let bob = UserId::new();
        let _a = register_drained(&hub, alice).await;
        let _b = register_drained(&hub, bob).await;

        hub.shutdown().await;

        assert!(hub.conns.is_empty());
        assert_eq!(directory.lookup(alice).await.unwrap(), None);
        assert_eq!(directory.lookup(bob).await.unwrap(), None);
    }
}
