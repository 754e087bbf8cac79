//! Pooled clients for inter-node delivery calls.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tonic::transport::Channel;

use courier_proto::CourierClient;

/// Process-wide cache of Courier clients, one per edge host.
///
/// Entries are dialed once and never evicted: the node set is small and
/// stable, clients multiplex concurrent calls, and the transport reconnects
/// on its own after a drop.
#[derive(Default)]
pub struct CourierPool {
    clients: RwLock<HashMap<String, CourierClient<Channel>>>,
}

impl CourierPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached client for `host`, dialing it first if needed.
    pub async fn get_or_create(
        &self,
        host: &str,
    ) -> Result<CourierClient<Channel>, tonic::transport::Error> {
        if let Some(client) = self.clients.read().await.get(host) {
            return Ok(client.clone());
        }

        let client = CourierClient::connect(format!("http://{host}")).await?;

        // Concurrent callers may race the dial; the first insert wins and
        // the loser's channel is dropped.
        let mut clients = self.clients.write().await;
        Ok(clients.entry(host.to_string()).or_insert(client).clone())
    }
}
