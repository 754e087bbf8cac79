pub mod config;
pub mod error;
pub mod hub;
pub mod rpc;
pub mod server;

use std::sync::Arc;

use config::Config;
use hub::Hub;

/// Shared state available to the websocket listener.
#[derive(Clone)]
pub struct EdgeState {
    pub hub: Arc<Hub>,
    pub config: Arc<Config>,
}
