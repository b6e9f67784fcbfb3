//! Hybrid sim-racing telemetry fusion.
//!
//! Slipstream reads a racing simulator through two independent channels and
//! serves one consistent snapshot of car and session state:
//!
//! - **Memory feed**: physics, graphics and static records pushed by a
//!   native memory reader at their own cadences.
//! - **Broadcast feed**: named events from a structured client, or raw UDP
//!   datagrams decoded without schema negotiation.
//!
//! # Features
//!
//! - **Binary decoding**: fixed-offset datagram decoder with a
//!   confidence-tagged heuristic fallback
//! - **Liveness**: per-source connect/disconnect tracking with a fixed timeout
//! - **Fusion**: per-category source priorities, recomputed on every input
//! - **Streaming**: `watch`-backed snapshot subscriptions with optional
//!   latest-wins throttling
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use slipstream::{FusionConfig, Slipstream, UpdateRate};
//!
//! #[tokio::main]
//! async fn main() -> slipstream::Result<()> {
//!     let connection = Slipstream::start(FusionConfig::default()).await?;
//!
//!     // The memory reader pushes its records through the feed handle.
//!     let feed = connection.feed();
//!     feed.push_physics(serde_json::json!({ "gear": -1, "speedKmh": 153.7 })).await?;
//!
//!     let mut snapshots = connection.subscribe(UpdateRate::Max(10));
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("{} km/h in {}", snapshot.realtime.speed_kmh, snapshot.realtime.gear);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod adapters;
pub mod config;
mod error;
pub mod sanitize;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and fusion
pub mod decoder;
pub mod fusion;
pub mod liveness;
pub mod sink;

// Stream-based runtime
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use adapters::*;
pub use error::*;
pub use types::*;

pub use config::{FusionConfig, UdpConfig};
pub use decoder::{BinaryPacketDecoder, ControlMessage, DecodedPacket, TelemetryRecord};
pub use fusion::{EngineStatus, FusionEngine, PriorityTable};
pub use liveness::{FixedQualityScore, LivenessTracker, QualityScorer};
pub use sanitize::{format_gear, parse_lap_time, sanitize};
pub use sink::{SnapshotSink, WatchSink};

// Runtime exports
pub use connection::{FeedHandle, FusionConnection};
pub use provider::{InboundEvent, InboundSource};
pub use providers::UdpBroadcastSource;

/// Entry point that assembles the fusion runtime.
///
/// One call builds the engine with its tracker and sink, spawns the driver
/// task, binds the UDP listener when enabled and returns the connection.
/// Nothing is global: two runtimes in one process are independent.
///
/// # Examples
///
/// ```rust,no_run
/// use slipstream::{FusionConfig, Slipstream};
///
/// #[tokio::main]
/// async fn main() -> slipstream::Result<()> {
///     let config = FusionConfig::from_yaml_file("slipstream.yaml")?;
///     let connection = Slipstream::start(config).await?;
///     println!("{:?}", connection.status().active_protocol);
///     Ok(())
/// }
/// ```
pub struct Slipstream;

impl Slipstream {
    /// Start the runtime with the default priority table and quality scores.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Config`] when the configuration does not
    /// validate. A UDP listener that cannot bind is not an error; the
    /// runtime continues without it.
    pub async fn start(config: FusionConfig) -> Result<FusionConnection> {
        FusionConnection::start(config).await
    }

    /// Start the runtime with a custom priority table and quality scorer.
    pub async fn start_with(
        config: FusionConfig,
        table: PriorityTable,
        scorer: Box<dyn QualityScorer>,
    ) -> Result<FusionConnection> {
        FusionConnection::start_with(config, table, scorer).await
    }
}
