// Configuration module entry point
// Loads and validates configuration, owns the immutable application state

mod prefix;
mod state;
mod types;

use std::net::SocketAddr;

pub use prefix::{normalize_prefix, PrefixError};
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServeConfig, ServerConfig};

impl Config {
    /// Load configuration from `serve.toml` (optional) and `DIRSERVE_*`
    /// environment variables, with built-in defaults for every key
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("serve")
    }

    /// Load configuration from the specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DIRSERVE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4000)?
            .set_default("serve.dir", ".")?
            .set_default("serve.prefix", "/")?
            .set_default("serve.dot", false)?
            .set_default("serve.explicit_index", false)?
            .set_default("serve.spa", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("http.enable_cors", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
