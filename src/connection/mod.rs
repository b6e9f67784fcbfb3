//! Running fusion runtime and its handles

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::{BroadcastEvent, MemoryRecord};
use crate::config::FusionConfig;
use crate::decoder;
use crate::driver::{Driver, DriverState};
use crate::fusion::{EngineStatus, FusionEngine, PriorityTable};
use crate::liveness::{FixedQualityScore, LivenessTracker, QualityScorer};
use crate::provider::InboundEvent;
use crate::providers::{UdpBroadcastSource, UdpStats};
use crate::sink::WatchSink;
use crate::stream::ThrottleExt;
use crate::types::{MergedSnapshot, UpdateRate};
use crate::{FusionError, Result};

/// Pushes memory-feed records and broadcast events into the runtime.
///
/// Cheap to clone; every clone feeds the same engine.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    events: mpsc::Sender<InboundEvent>,
}

impl FeedHandle {
    pub async fn push(&self, event: InboundEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| FusionError::channel_closed("fusion driver stopped"))
    }

    /// Queue without waiting. Returns `Ok(false)` when the event was dropped
    /// because the driver is behind.
    pub fn try_push(&self, event: InboundEvent) -> Result<bool> {
        match self.events.try_send(event) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(source = %event.source(), "inbound queue full, event dropped");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(FusionError::channel_closed("fusion driver stopped"))
            }
        }
    }

    pub async fn push_physics(&self, raw: Value) -> Result<()> {
        self.push(MemoryRecord::Physics(raw).into()).await
    }

    pub async fn push_graphics(&self, raw: Value) -> Result<()> {
        self.push(MemoryRecord::Graphics(raw).into()).await
    }

    pub async fn push_static(&self, raw: Value) -> Result<()> {
        self.push(MemoryRecord::Static(raw).into()).await
    }

    pub async fn push_broadcast_event(&self, event: BroadcastEvent) -> Result<()> {
        self.push(event.into()).await
    }

    /// Decode a datagram received elsewhere and queue it. Returns `Ok(false)`
    /// when the datagram does not decode.
    pub async fn push_datagram(&self, data: &[u8]) -> Result<bool> {
        match decoder::decode(data) {
            Some(packet) => self.push(packet.into()).await.map(|()| true),
            None => Ok(false),
        }
    }
}

#[derive(Debug, Clone)]
struct UdpHandle {
    local_addr: SocketAddr,
    stats: UdpStats,
}

/// Handle to a running fusion runtime.
///
/// Dropping the connection stops the driver and the UDP listener.
#[derive(Debug)]
pub struct FusionConnection {
    events: mpsc::Sender<InboundEvent>,
    snapshots: watch::Receiver<Arc<MergedSnapshot>>,
    status: watch::Receiver<EngineStatus>,
    publish_hz: f64,
    udp: Option<UdpHandle>,
    cancel: CancellationToken,
}

impl FusionConnection {
    /// Start with the default priority table and quality scores.
    pub async fn start(config: FusionConfig) -> Result<Self> {
        Self::start_with(config, PriorityTable::default(), Box::new(FixedQualityScore::default()))
            .await
    }

    /// Start with a custom priority table and quality scorer.
    ///
    /// A UDP listener that cannot bind is logged and skipped; the broadcast
    /// source then stays unknown unless events are pushed through
    /// [`feed`](Self::feed).
    pub async fn start_with(
        config: FusionConfig,
        table: PriorityTable,
        scorer: Box<dyn QualityScorer>,
    ) -> Result<Self> {
        config.validate()?;

        let (sink, snapshots) = WatchSink::new();
        let tracker = LivenessTracker::with_scorer(config.liveness_timeout(), scorer);
        let engine = FusionEngine::new(table, tracker, Box::new(sink));
        let state = DriverState::new(engine, config.memory_schema);
        let channels =
            Driver::spawn(state, snapshots, config.tick_interval(), config.event_buffer);

        let udp = if config.udp.enabled {
            match UdpBroadcastSource::bind(&config.udp).await {
                Ok(source) => {
                    let handle = UdpHandle { local_addr: source.local_addr(), stats: source.stats() };
                    Driver::attach(source, channels.events.clone(), channels.cancel.child_token());
                    Some(handle)
                }
                Err(e) => {
                    warn!(error = %e, "broadcast listener unavailable, continuing without it");
                    None
                }
            }
        } else {
            debug!("UDP listener disabled");
            None
        };

        info!(
            tick_ms = config.tick_interval_ms,
            timeout_ms = config.liveness_timeout_ms,
            udp = udp.is_some(),
            "Fusion runtime started"
        );

        Ok(Self {
            events: channels.events,
            snapshots: channels.snapshots,
            status: channels.status,
            publish_hz: config.tick_hz(),
            udp,
            cancel: channels.cancel,
        })
    }

    /// Handle for pushing memory-feed records and broadcast events.
    pub fn feed(&self) -> FeedHandle {
        FeedHandle { events: self.events.clone() }
    }

    /// Stream of published snapshots.
    ///
    /// Starts with the current snapshot. Slow consumers skip intermediate
    /// snapshots; with [`UpdateRate::Max`] the stream is also throttled.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<MergedSnapshot>> + 'static {
        let snapshots = WatchStream::new(self.snapshots.clone());
        match rate.throttle_interval(self.publish_hz) {
            None => snapshots.boxed(),
            Some(period) => snapshots.throttle(period).boxed(),
        }
    }

    /// Stream of engine status updates.
    pub fn status_updates(&self) -> impl Stream<Item = EngineStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    pub fn current_snapshot(&self) -> Arc<MergedSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    /// Publications per second guaranteed by the tick.
    pub fn publish_hz(&self) -> f64 {
        self.publish_hz
    }

    /// Address the UDP listener is bound to, if it is running.
    pub fn udp_local_addr(&self) -> Option<SocketAddr> {
        self.udp.as_ref().map(|udp| udp.local_addr)
    }

    pub fn udp_stats(&self) -> Option<UdpStats> {
        self.udp.as_ref().map(|udp| udp.stats.clone())
    }

    /// Stop the runtime. Same as dropping the connection.
    pub fn shutdown(self) {}
}

impl Drop for FusionConnection {
    fn drop(&mut self) {
        debug!("Dropping fusion connection");
        self.cancel.cancel();
    }
}
