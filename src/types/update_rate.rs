//! Delivery rate for snapshot subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often a subscriber wants to see snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every publication: each inbound update plus every tick
    Native,

    /// At most this many snapshots per second, latest wins.
    /// A zero rate is treated as one per second.
    Max(u32),
}

impl UpdateRate {
    /// Resolve the requested rate against the engine's publication rate.
    ///
    /// Asking for at least the tick rate gains nothing over `Native`.
    pub fn normalize(self, publish_hz: f64) -> Self {
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(hz) if f64::from(hz) >= publish_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz.max(1)),
        }
    }

    /// Throttle interval, or `None` when every snapshot should pass.
    pub fn throttle_interval(self, publish_hz: f64) -> Option<Duration> {
        match self.normalize(publish_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }
}
