// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub serve: ServeConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Serving behavior configuration
///
/// Fixed for the process lifetime; mirrors the command surface of the server:
/// which directory to serve, under which URL prefix, and which of the
/// dot-file / explicit-index / SPA gates are active.
#[derive(Debug, Deserialize, Clone)]
pub struct ServeConfig {
    /// Directory to serve files from (must exist at startup)
    pub dir: String,
    /// Raw URL mount prefix, normalized at startup
    pub prefix: String,
    /// Serve dot files (names starting with '.')
    pub dot: bool,
    /// Only serve index.html files when the URL path names them;
    /// directory requests always render a listing
    pub explicit_index: bool,
    /// Serve the root index.html for all unknown file paths
    pub spa: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}
