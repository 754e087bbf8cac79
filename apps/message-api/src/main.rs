use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_common::directory::RedisDirectory;
use message_api::config::Config;
use message_api::fanout::Coordinator;
use message_api::store::{ChatStore, MemoryStore};
use message_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let directory = Arc::new(
        RedisDirectory::connect(&config.redis_addr)
            .await
            .expect("failed to connect to directory store"),
    );

    // In-memory store for single-node development. The production
    // deployment binds the durable relational store here.
    let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new());

    let coordinator = Arc::new(Coordinator::new(directory));

    let state = AppState {
        store,
        coordinator,
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = axum::Router::new()
        .merge(message_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .expect("failed to bind");
    tracing::info!(addr = %config.listen_address, "message api listening");

    axum::serve(listener, app).await.expect("server error");
}
