use std::net::SocketAddr;
use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};

use courier_common::auth::Claims;
use courier_common::directory::Directory;
use courier_common::{RoomId, UserId};
use message_api::config::Config;
use message_api::fanout::Coordinator;
use message_api::store::{MemoryStore, Room};
use message_api::AppState;

pub const JWT_SECRET: &str = "message-test-secret";

/// Start the message API on an ephemeral port against the given directory.
/// Returns the server address and the seeded store.
pub async fn start_app(directory: Arc<dyn Directory>) -> (SocketAddr, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = Config {
        listen_address: "127.0.0.1:0".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        redis_addr: String::new(),
    };

    let state = AppState {
        store: store.clone(),
        coordinator: Arc::new(Coordinator::new(directory)),
        config: Arc::new(config),
    };

    let app = message_api::routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, store)
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

/// Seed a room with the given member set. Room management lives outside the
/// delivery core, so tests populate it directly.
pub fn seed_room(store: &MemoryStore, members: &[UserId]) -> RoomId {
    let room = Room {
        id: RoomId::new(),
        name: "test room".to_string(),
        members: members.to_vec(),
    };
    let room_id = room.id;
    store.insert_room(room);
    room_id
}
