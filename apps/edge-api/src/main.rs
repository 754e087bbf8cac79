use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_common::directory::RedisDirectory;
use courier_proto::CourierServer;
use edge_api::config::Config;
use edge_api::hub::Hub;
use edge_api::rpc::CourierService;
use edge_api::EdgeState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let directory = RedisDirectory::connect(&config.redis_addr)
        .await
        .expect("failed to connect to directory store");

    let hub = Arc::new(Hub::new(config.hostname.clone(), Arc::new(directory)));

    // Inter-node RPC.
    let grpc_addr: SocketAddr = config
        .grpc_listen_address
        .parse()
        .expect("invalid GRPC_LISTEN_ADDRESS");
    let courier = CourierService::new(hub.clone());
    tokio::spawn(async move {
        tracing::info!(%grpc_addr, "courier rpc listening");
        if let Err(err) = tonic::transport::Server::builder()
            .add_service(CourierServer::new(courier))
            .serve(grpc_addr)
            .await
        {
            tracing::error!(%err, "courier rpc server exited");
        }
    });

    let state = EdgeState {
        hub: hub.clone(),
        config: Arc::new(config.clone()),
    };
    let app = edge_api::server::router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.websocket_listen_address)
        .await
        .expect("failed to bind");
    tracing::info!(addr = %config.websocket_listen_address, "websocket listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server error");

    // Every connection must unregister before the hub goes away.
    hub.shutdown().await;
}
