// Application state module
// Immutable per-process state owned by the router

use std::path::PathBuf;

use super::prefix::normalize_prefix;
use super::types::Config;

/// Application state, shared read-only across request handlers
///
/// Built once at startup from the validated configuration. The normalized
/// mount prefix and the resolved root directory never change afterwards.
pub struct AppState {
    pub config: Config,
    /// Normalized mount prefix, starts and ends with '/'
    pub prefix: String,
    /// Root directory files are served from
    pub root: PathBuf,
    /// Display name for the root directory in listings
    pub root_label: String,
}

impl AppState {
    /// Create `AppState`, normalizing the prefix and validating the root
    ///
    /// Fails before any request is served when the prefix is malformed or
    /// the serve directory does not exist.
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let prefix = normalize_prefix(&config.serve.prefix)?;

        let root = PathBuf::from(&config.serve.dir);
        if !root.is_dir() {
            return Err(format!("serve directory not found: {}", root.display()).into());
        }

        let root_label = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&config.serve.dir)
            .to_string();

        Ok(Self {
            config,
            prefix,
            root,
            root_label,
        })
    }
}
