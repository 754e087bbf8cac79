//! The fan-out coordinator: deliver one persisted message to every online
//! recipient, whichever node holds their socket.

pub mod pool;

use std::sync::Arc;

use futures_util::future::join_all;
use tonic::Code;

use courier_common::directory::Directory;
use courier_common::{UserId, Webhook};
use courier_proto::MessageRequest;

use pool::CourierPool;

/// Process-wide fan-out context: the directory that locates recipients and
/// the client pool that reaches their nodes. Constructed once and stored in
/// `AppState`.
pub struct Coordinator {
    directory: Arc<dyn Directory>,
    pool: CourierPool,
}

impl Coordinator {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            pool: CourierPool::new(),
        }
    }

    /// Deliver `payload` to every recipient with a directory entry.
    ///
    /// Recipients are dispatched in parallel. A missing entry means the
    /// user is offline and is skipped silently — history read-back covers
    /// them. Per-recipient failures never fail the broadcast: the message
    /// is already durable.
    pub async fn broadcast(&self, recipients: &[UserId], payload: &[u8]) {
        let webhooks = match self.directory.lookup_many(recipients).await {
            Ok(webhooks) => webhooks,
            Err(err) => {
                tracing::error!(%err, count = recipients.len(), "unable to list webhooks");
                return;
            }
        };

        let dispatches = recipients.iter().zip(webhooks).filter_map(|(user_id, webhook)| {
            webhook.map(|webhook| self.deliver(*user_id, webhook, payload))
        });

        join_all(dispatches).await;
    }

    /// The direct-message fast path: resolve and deliver to a single user.
    pub async fn unicast(&self, user_id: UserId, payload: &[u8]) {
        match self.directory.lookup(user_id).await {
            Ok(Some(webhook)) => self.deliver(user_id, webhook, payload).await,
            Ok(None) => {} // offline
            Err(err) => {
                tracing::error!(%err, %user_id, "unable to get webhook");
            }
        }
    }

    /// One recipient: parse the webhook, pick the pooled client for its
    /// host, and issue the delivery RPC.
    ///
    /// The directory entry is invalidated only on strong evidence of
    /// staleness — an unparseable entry, or the owning node reporting the
    /// socket gone. Transport errors leave it in place: the host may be
    /// briefly unreachable while the socket is alive.
    async fn deliver(&self, user_id: UserId, raw_webhook: String, payload: &[u8]) {
        let webhook: Webhook = match raw_webhook.parse() {
            Ok(webhook) => webhook,
            Err(err) => {
                tracing::warn!(%err, %user_id, webhook = %raw_webhook, "invalidating unparseable webhook");
                self.invalidate(user_id).await;
                return;
            }
        };

        let mut client = match self.pool.get_or_create(webhook.host()).await {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(%err, host = webhook.host(), "unable to reach edge node");
                return;
            }
        };

        let request = MessageRequest {
            uuid: webhook.socket_id().to_string(),
            payload: payload.to_vec(),
        };

        match client.send_message(request).await {
            Ok(_) => {}
            Err(status) if status.code() == Code::NotFound => {
                tracing::info!(%user_id, host = webhook.host(), "socket gone, invalidating webhook");
                self.invalidate(user_id).await;
            }
            Err(status) => {
                tracing::warn!(
                    code = ?status.code(),
                    %user_id,
                    host = webhook.host(),
                    "unable to send message"
                );
            }
        }
    }

    async fn invalidate(&self, user_id: UserId) {
        if let Err(err) = self.directory.remove(user_id).await {
            tracing::warn!(%err, %user_id, "unable to remove stale webhook");
        }
    }
}
