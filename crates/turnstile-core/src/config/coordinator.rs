//! Admission coordinator configuration.

use serde::{Deserialize, Serialize};

/// Top-level coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Coordinator provider type: `"redis"` or `"memory"`.
    ///
    /// The memory provider serializes all events through one process and is
    /// only suitable for single-node deployments and tests.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific coordinator configuration.
    #[serde(default)]
    pub redis: RedisCoordinatorConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCoordinatorConfig::default(),
        }
    }
}

/// Redis coordinator backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCoordinatorConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all Turnstile coordinator keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisCoordinatorConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "turnstile:".to_string()
}
