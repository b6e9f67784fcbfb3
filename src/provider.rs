//! Inbound event sources

use crate::Result;
use crate::adapters::{BroadcastEvent, BroadcastInput, MemoryRecord};
use crate::decoder::DecodedPacket;
use crate::types::SourceId;

/// One raw input for the fusion driver.
///
/// Memory records and broadcast inputs travel through the same channel, so
/// the engine sees a single ordered stream whatever the source cadence.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Memory(MemoryRecord),
    Broadcast(BroadcastInput),
}

impl InboundEvent {
    /// The source the event belongs to.
    pub fn source(&self) -> SourceId {
        match self {
            InboundEvent::Memory(_) => SourceId::SharedMemory,
            InboundEvent::Broadcast(_) => SourceId::Broadcasting,
        }
    }
}

impl From<MemoryRecord> for InboundEvent {
    fn from(record: MemoryRecord) -> Self {
        InboundEvent::Memory(record)
    }
}

impl From<BroadcastEvent> for InboundEvent {
    fn from(event: BroadcastEvent) -> Self {
        InboundEvent::Broadcast(BroadcastInput::Event(event))
    }
}

impl From<DecodedPacket> for InboundEvent {
    fn from(packet: DecodedPacket) -> Self {
        InboundEvent::Broadcast(BroadcastInput::Packet(packet))
    }
}

/// A source the driver pulls events from.
///
/// Push-style collaborators use [`crate::FeedHandle`] instead; this trait is
/// for sources that own their I/O, such as the UDP listener.
#[async_trait::async_trait]
pub trait InboundSource: Send + 'static {
    /// Wait for the next event.
    ///
    /// Returns:
    /// - `Ok(Some(event))` - an event to ingest
    /// - `Ok(None)` - the source ended
    /// - `Err(e)` - a failed read; the caller may retry
    async fn next_event(&mut self) -> Result<Option<InboundEvent>>;

    /// Which fused source this feeds.
    fn source_id(&self) -> SourceId;
}
