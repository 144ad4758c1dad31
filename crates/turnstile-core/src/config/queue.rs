//! Per-event queue defaults.

use serde::{Deserialize, Serialize};

/// Defaults applied when an event's queue configuration omits a value.
///
/// Capacity limits are never defaulted: an event without an explicit
/// `QueueConfig` row has no queue, and admission requests against it fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfigDefaults {
    /// Default checkout window (active-slot TTL) in seconds.
    #[serde(default = "default_reservation_ttl")]
    pub default_reservation_ttl_seconds: u32,
}

impl Default for QueueConfigDefaults {
    fn default() -> Self {
        Self {
            default_reservation_ttl_seconds: default_reservation_ttl(),
        }
    }
}

fn default_reservation_ttl() -> u32 {
    300
}
