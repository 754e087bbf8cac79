/// Message API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address.
    pub listen_address: String,
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
            listen_address: required_var("LISTEN_ADDRESS"),
            jwt_secret: required_var("JWT_SECRET"),
            redis_addr: required_var("REDIS_ADDR"),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
