use std::net::SocketAddr;
use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};

use courier_common::auth::Claims;
use courier_common::directory::MemoryDirectory;
use courier_common::UserId;
use edge_api::config::Config;
use edge_api::hub::Hub;
use edge_api::EdgeState;

pub const JWT_SECRET: &str = "edge-test-secret";

/// Advertised hostname baked into test webhooks.
pub const HOSTNAME: &str = "edge-test:8081";

/// Start a real WebSocket server on an ephemeral port. Returns its address
/// plus the hub and directory backing it, so tests can drive deliveries and
/// observe registration state.
pub async fn start_edge() -> (SocketAddr, Arc<Hub>, Arc<MemoryDirectory>) {
    let directory = Arc::new(MemoryDirectory::new());
    let hub = Arc::new(Hub::new(HOSTNAME, directory.clone()));

    let config = Config {
        hostname: HOSTNAME.to_string(),
        grpc_listen_address: "127.0.0.1:0".to_string(),
        websocket_listen_address: "127.0.0.1:0".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        redis_addr: String::new(),
    };

    let state = EdgeState {
        hub: hub.clone(),
        config: Arc::new(config),
    };
    let app = edge_api::server::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, hub, directory)
}

/// Mint a bearer token the way the external account service would.
pub fn mint_token(user_id: UserId) -> String {
    let claims = Claims {
        id: user_id.to_string(),
        username: "tester".to_string(),
        email: "tester@example.com".to_string(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("mint token")
}
