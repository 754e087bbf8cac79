/// Edge node configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Advertised `host:port` used to build webhooks. This is where other
    /// nodes reach our RPC endpoint, not necessarily the bind address.
    pub hostname: String,
    /// Inter-node RPC bind address.
    pub grpc_listen_address: String,
    /// Client websocket bind address.
    pub websocket_listen_address: String,
    /// HMAC key for bearer token verification.
    pub jwt_secret: String,
    /// Directory store endpoint.
    pub redis_addr: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            hostname: required_var("HOSTNAME"),
            grpc_listen_address: required_var("GRPC_LISTEN_ADDRESS"),
            websocket_listen_address: required_var("WEBSOCKET_LISTEN_ADDRESS"),
            jwt_secret: required_var("JWT_SECRET"),
            redis_addr: required_var("REDIS_ADDR"),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
