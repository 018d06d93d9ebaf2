//! Service configuration.
//!
//! Provides [`ServiceConfig`], loaded from environment variables with
//! sensible defaults. The object-size ceiling lives here so the HTTP
//! layer and the server binary agree on a single source of truth.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::MAX_OBJECT_SIZE;

/// Configuration for the object-storage service.
///
/// # Examples
///
/// ```
/// use ministore_core::config::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:9000");
/// assert!(config.data_dir.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Bind address for the HTTP listener.
    #[builder(default = String::from("0.0.0.0:9000"))]
    pub listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Data directory for payload files. When unset, payloads stay in
    /// memory.
    #[builder(default)]
    pub data_dir: Option<String>,

    /// Maximum accepted size for a single object or part, in bytes.
    #[builder(default = MAX_OBJECT_SIZE)]
    pub max_object_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:9000"),
            log_level: String::from("info"),
            data_dir: None,
            max_object_size: MAX_OBJECT_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LISTEN` | `0.0.0.0:9000` |
    /// | `LOG_LEVEL` | `info` |
    /// | `DATA_DIR` | *(unset — in-memory payloads)* |
    /// | `MAX_OBJECT_SIZE` | `5368709120` (5 GiB) |
    ///
    /// Unparsable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("DATA_DIR") {
            if !v.is_empty() {
                config.data_dir = Some(v);
            }
        }
        if let Ok(v) = std::env::var("MAX_OBJECT_SIZE") {
            if let Ok(size) = v.parse::<u64>() {
                config.max_object_size = size;
            }
        }

        config
    }
}
