//! Driver spawns and owns the fusion task
//!
//! One task owns the [`FusionEngine`] and both adapters. Everything that
//! touches fused state happens on it, one event at a time: inbound events,
//! the periodic tick, disconnect deadlines and cancellation. Sources that do
//! their own I/O run in separate pump tasks and only talk to the driver
//! through the inbound channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::adapters::{
    BroadcastEvent, BroadcastFeedAdapter, BroadcastOutcome, MemoryFeedAdapter, SchemaVersion,
};
use crate::fusion::{EngineStatus, FusionEngine};
use crate::liveness::Stamp;
use crate::provider::{InboundEvent, InboundSource};
use crate::types::{MergedSnapshot, SourceId};

/// Consecutive source errors tolerated before a pump gives up.
pub const MAX_SOURCE_ERRORS: u32 = 10;

/// Handles returned by [`Driver::spawn`].
#[derive(Debug)]
pub struct DriverChannels {
    /// Inbound event sender; clone it for every producer
    pub events: mpsc::Sender<InboundEvent>,
    /// Latest published snapshot
    pub snapshots: watch::Receiver<Arc<MergedSnapshot>>,
    /// Engine status after the last handled event
    pub status: watch::Receiver<EngineStatus>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Engine plus adapters: the state the driver task owns.
#[derive(Debug)]
pub struct DriverState {
    engine: FusionEngine,
    memory: MemoryFeedAdapter,
    broadcast: BroadcastFeedAdapter,
}

impl DriverState {
    pub fn new(engine: FusionEngine, memory_schema: SchemaVersion) -> Self {
        Self {
            engine,
            memory: MemoryFeedAdapter::new(memory_schema),
            broadcast: BroadcastFeedAdapter::new(),
        }
    }

    /// Normalize one event and feed the result to the engine.
    pub fn handle(&mut self, event: &InboundEvent, now: Stamp) {
        match event {
            InboundEvent::Memory(record) => {
                let sample = self.memory.normalize(record);
                self.engine.ingest_at(sample, now);
            }
            InboundEvent::Broadcast(input) => match self.broadcast.apply(input) {
                BroadcastOutcome::Sample(sample) => {
                    self.engine.ingest_at(sample, now);
                }
                BroadcastOutcome::Disconnected => {
                    if self.engine.force_disconnect(SourceId::Broadcasting, now).is_none() {
                        trace!("broadcast disconnect signal while not connected");
                    }
                }
                BroadcastOutcome::Ignored => {}
            },
        }
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FusionEngine {
        &mut self.engine
    }
}

/// Spawns the fusion task and source pumps.
pub struct Driver;

impl Driver {
    /// Spawn the fusion task.
    ///
    /// `snapshots` must be a receiver of the watch channel the engine's sink
    /// publishes to.
    pub fn spawn(
        state: DriverState,
        snapshots: watch::Receiver<Arc<MergedSnapshot>>,
        tick_interval: Duration,
        event_buffer: usize,
    ) -> DriverChannels {
        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(state.engine.status());
        let cancel = CancellationToken::new();

        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::fusion_task(state, event_rx, status_tx, tick_interval, cancel_task).await;
        });

        DriverChannels { events: event_tx, snapshots, status: status_rx, cancel }
    }

    /// Spawn a pump forwarding `source` into the driver's inbound channel.
    ///
    /// The pump stops on cancellation, when the source ends, when the driver
    /// is gone, or after [`MAX_SOURCE_ERRORS`] consecutive errors. A
    /// broadcast pump that stops on its own reports a disconnect.
    pub fn attach<S>(source: S, events: mpsc::Sender<InboundEvent>, cancel: CancellationToken)
    where
        S: InboundSource,
    {
        tokio::spawn(async move {
            Self::source_task(source, events, cancel).await;
        });
    }

    async fn fusion_task(
        mut state: DriverState,
        mut events: mpsc::Receiver<InboundEvent>,
        status: watch::Sender<EngineStatus>,
        tick_interval: Duration,
        cancel: CancellationToken,
    ) {
        info!(tick_ms = tick_interval.as_millis() as u64, "Fusion task started");
        let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = state.engine.next_deadline();
            let timeout = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Fusion task cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => state.handle(&event, Stamp::now()),
                    None => {
                        debug!("All event senders dropped");
                        break;
                    }
                },
                _ = timeout, if deadline.is_some() => {
                    state.engine.check_liveness(Stamp::now());
                }
                _ = ticker.tick() => {
                    state.engine.tick();
                }
            }

            status.send_replace(state.engine.status());
        }

        let status = state.engine.status();
        info!(
            samples = status.samples_ingested,
            snapshots = status.snapshots_published,
            "Fusion task ended"
        );
    }

    async fn source_task<S>(
        mut source: S,
        events: mpsc::Sender<InboundEvent>,
        cancel: CancellationToken,
    ) where
        S: InboundSource,
    {
        let source_id = source.source_id();
        info!(source = %source_id, "Source pump started");
        let mut forwarded = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(source = %source_id, "Source pump cancelled");
                    return;
                }
                result = source.next_event() => result,
            };

            match result {
                Ok(Some(event)) => {
                    error_count = 0;
                    forwarded += 1;
                    if events.send(event).await.is_err() {
                        debug!(source = %source_id, "Driver gone, stopping pump");
                        return;
                    }
                }
                Ok(None) => {
                    info!(source = %source_id, forwarded, "Source ended");
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    warn!(source = %source_id, error = %e, "Source error ({}/{})", error_count, MAX_SOURCE_ERRORS);

                    if error_count >= MAX_SOURCE_ERRORS {
                        error!(source = %source_id, "Too many source errors, stopping pump");
                        break;
                    }

                    // 50ms, 100ms, 200ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        if source_id == SourceId::Broadcasting
            && events.send(BroadcastEvent::Disconnect.into()).await.is_err()
        {
            debug!(source = %source_id, "Driver gone, disconnect not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{BroadcastInput, MemoryRecord};
    use crate::fusion::PriorityTable;
    use crate::liveness::LivenessTracker;
    use crate::sink::WatchSink;
    use crate::test_utils::fixtures;
    use crate::types::{ActiveProtocol, LinkState};
    use crate::{FusionError, Result};

    use std::collections::VecDeque;

    const TIMEOUT: Duration = Duration::from_millis(5000);
    const TICK: Duration = Duration::from_millis(50);

    fn spawn() -> DriverChannels {
        let (sink, rx) = WatchSink::new();
        let engine =
            FusionEngine::new(PriorityTable::default(), LivenessTracker::new(TIMEOUT), Box::new(sink));
        Driver::spawn(DriverState::new(engine, SchemaVersion::V1), rx, TICK, 16)
    }

    fn physics(gear: i64, speed: f64) -> InboundEvent {
        MemoryRecord::Physics(fixtures::physics_json(gear, speed)).into()
    }

    /// Yield until the fusion task has drained the channel.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    struct ScriptedSource {
        script: VecDeque<Result<Option<InboundEvent>>>,
    }

    #[async_trait::async_trait]
    impl InboundSource for ScriptedSource {
        async fn next_event(&mut self) -> Result<Option<InboundEvent>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn source_id(&self) -> SourceId {
            SourceId::Broadcasting
        }
    }

    #[test]
    fn state_routes_disconnect_signal_to_liveness() {
        let (sink, _rx) = WatchSink::new();
        let engine =
            FusionEngine::new(PriorityTable::default(), LivenessTracker::new(TIMEOUT), Box::new(sink));
        let mut state = DriverState::new(engine, SchemaVersion::V1);
        let now = Stamp::new(Instant::now(), 1);

        state.handle(&BroadcastEvent::RealtimeCarUpdate(fixtures::car_update_json(3, 99.0, 2)).into(), now);
        assert!(state.engine().tracker().is_connected(SourceId::Broadcasting));

        state.handle(&BroadcastEvent::Disconnect.into(), now);
        assert_eq!(state.engine().tracker().state(SourceId::Broadcasting), LinkState::Disconnected);
        // A second signal is not a second transition.
        let published = state.engine().status().snapshots_published;
        state.handle(&BroadcastEvent::Disconnect.into(), now);
        assert_eq!(state.engine().status().snapshots_published, published);
    }

    #[tokio::test(start_paused = true)]
    async fn ingest_publishes_immediately() {
        let channels = spawn();
        let mut snapshots = channels.snapshots.clone();
        channels.events.send(physics(-1, 153.7)).await.unwrap();

        snapshots.changed().await.unwrap();
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.realtime.gear, "R");
        assert_eq!(snapshot.realtime.speed_kmh, 154);
        assert_eq!(snapshot.active_protocol, ActiveProtocol::SharedMemory);
        channels.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn tick_republishes_without_input() {
        let channels = spawn();
        channels.events.send(physics(2, 60.0)).await.unwrap();
        settle().await;
        let before = channels.status.borrow().snapshots_published;

        tokio::time::sleep(TICK * 4 + Duration::from_millis(1)).await;
        settle().await;
        let after = channels.status.borrow().snapshots_published;
        assert!(after >= before + 4, "expected at least 4 ticks, got {}", after - before);
        channels.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn silent_source_disconnects_once() {
        let channels = spawn();
        channels.events.send(physics(2, 60.0)).await.unwrap();
        settle().await;
        assert!(channels.snapshots.borrow().is_connected);

        tokio::time::sleep(TIMEOUT - Duration::from_millis(10)).await;
        settle().await;
        assert!(channels.status.borrow().liveness.shared_memory.connected);

        tokio::time::sleep(Duration::from_millis(20)).await;
        settle().await;
        let status = channels.status.borrow().clone();
        assert_eq!(status.liveness.shared_memory.state, LinkState::Disconnected);
        assert_eq!(status.active_protocol, ActiveProtocol::None);
        assert!(!channels.snapshots.borrow().is_connected);

        channels.events.send(physics(2, 61.0)).await.unwrap();
        settle().await;
        assert!(channels.status.borrow().liveness.shared_memory.connected);
        channels.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_broadcast_pump_reports_disconnect() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut script: VecDeque<Result<Option<InboundEvent>>> = VecDeque::new();
        script.push_back(Ok(Some(
            BroadcastEvent::RealtimeCarUpdate(fixtures::car_update_json(5, 180.0, 4)).into(),
        )));
        for _ in 0..MAX_SOURCE_ERRORS {
            script.push_back(Err(FusionError::connection_failed("socket closed")));
        }
        let (tx, mut rx) = mpsc::channel(4);
        Driver::attach(ScriptedSource { script }, tx, CancellationToken::new());

        assert!(matches!(
            rx.recv().await,
            Some(InboundEvent::Broadcast(BroadcastInput::Event(BroadcastEvent::RealtimeCarUpdate(_))))
        ));
        assert_eq!(rx.recv().await, Some(BroadcastEvent::Disconnect.into()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn ended_pump_without_driver_returns() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let source = ScriptedSource { script: VecDeque::new() };
        tokio::time::timeout(
            Duration::from_secs(1),
            Driver::source_task(source, tx, CancellationToken::new()),
        )
        .await
        .expect("pump should stop when the disconnect cannot be delivered");
    }

    #[tokio::test(start_paused = true)]
    async fn pump_feeds_driver() {
        let channels = spawn();
        let mut script: VecDeque<Result<Option<InboundEvent>>> = VecDeque::new();
        script.push_back(Ok(Some(
            BroadcastEvent::RealtimeCarUpdate(fixtures::car_update_json(5, 180.0, 4)).into(),
        )));
        Driver::attach(ScriptedSource { script }, channels.events.clone(), channels.cancel.clone());

        let mut status = channels.status.clone();
        let seen = status.wait_for(|s| s.samples_ingested == 1).await.unwrap().clone();
        assert_eq!(seen.active_protocol, ActiveProtocol::Broadcasting);
        // The scripted source ends right away, which counts as a disconnect.
        let ended = status
            .wait_for(|s| s.liveness.broadcasting.state == LinkState::Disconnected)
            .await
            .unwrap()
            .clone();
        assert_eq!(ended.samples_ingested, 1);
        channels.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_senders_stops_task() {
        let channels = spawn();
        let DriverChannels { events, mut status, .. } = channels;
        drop(events);
        // The status sender is dropped when the task ends.
        while status.changed().await.is_ok() {}
    }
}
