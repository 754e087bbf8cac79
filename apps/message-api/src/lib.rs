pub mod auth;
pub mod config;
pub mod error;
pub mod fanout;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use fanout::Coordinator;
use store::ChatStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub coordinator: Arc<Coordinator>,
    pub config: Arc<Config>,
}
