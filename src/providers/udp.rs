//! Raw-datagram broadcast source

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tracing::{debug, info, trace, warn};

use crate::config::UdpConfig;
use crate::decoder::{BinaryPacketDecoder, ControlMessage, DecodedPacket};
use crate::provider::{InboundEvent, InboundSource};
use crate::types::SourceId;
use crate::{FusionError, Result};

/// Message type of the connection request sent to the simulator.
const CONNECTION_REQUEST: u32 = 1;

/// Datagram counters, shared with whoever holds a clone.
#[derive(Debug, Clone, Default)]
pub struct UdpStats {
    received: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl UdpStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Datagrams that were too short or carried nothing plausible.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Listens for broadcast datagrams and decodes them.
///
/// Registration results addressed to another connection id are consumed
/// here; every other decoded datagram is forwarded to the driver.
#[derive(Debug)]
pub struct UdpBroadcastSource {
    socket: UdpSocket,
    local_addr: SocketAddr,
    peer: String,
    connection_id: u32,
    decoder: BinaryPacketDecoder,
    buf: Vec<u8>,
    registered: bool,
    stats: UdpStats,
}

impl UdpBroadcastSource {
    /// Bind the listener and send the connection request.
    ///
    /// Falls back to `fallback_port` when `port` is already taken.
    pub async fn bind(config: &UdpConfig) -> Result<Self> {
        let socket = match UdpSocket::bind((config.bind_host.as_str(), config.port)).await {
            Ok(socket) => socket,
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                debug!(port = config.port, fallback = config.fallback_port, "port in use, trying fallback");
                UdpSocket::bind((config.bind_host.as_str(), config.fallback_port)).await.map_err(
                    |e| {
                        FusionError::connection_failed_with_source(
                            format!(
                                "cannot bind {}:{} or fallback {}",
                                config.bind_host, config.port, config.fallback_port
                            ),
                            Box::new(e),
                        )
                    },
                )?
            }
            Err(e) => {
                return Err(FusionError::connection_failed_with_source(
                    format!("cannot bind {}:{}", config.bind_host, config.port),
                    Box::new(e),
                ));
            }
        };
        let local_addr = socket.local_addr()?;
        info!(addr = %local_addr, "broadcast listener bound");

        let source = Self {
            socket,
            local_addr,
            peer: format!("{}:{}", config.bind_host, config.peer_port),
            connection_id: config.connection_id,
            decoder: BinaryPacketDecoder::new(),
            buf: vec![0u8; config.max_datagram],
            registered: false,
            stats: UdpStats::default(),
        };

        if let Err(e) = source.request_connection().await {
            warn!(peer = %source.peer, error = %e, "connection request failed, listening anyway");
        }
        Ok(source)
    }

    /// Send the 8-byte connection request to the peer port.
    pub async fn request_connection(&self) -> Result<()> {
        let request = connection_request(self.connection_id);
        self.socket.send_to(&request, self.peer.as_str()).await.map_err(|e| {
            FusionError::connection_failed_with_source(
                format!("cannot reach {}", self.peer),
                Box::new(e),
            )
        })?;
        debug!(peer = %self.peer, connection_id = self.connection_id, "connection request sent");
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// Whether the simulator accepted our connection request.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn dropped_datagrams(&self) -> u64 {
        self.stats.dropped()
    }

    pub fn stats(&self) -> UdpStats {
        self.stats.clone()
    }

    /// Decide what to do with a decoded datagram. `None` means it was
    /// consumed here.
    fn route(&mut self, packet: DecodedPacket) -> Option<InboundEvent> {
        if let DecodedPacket::Control(ControlMessage::RegistrationResult { connection_id, success }) =
            &packet
        {
            if *connection_id != self.connection_id {
                debug!(connection_id, "registration result for another client");
                return None;
            }
            self.registered = *success;
            info!(connection_id, success, "broadcast registration result");
        }
        Some(packet.into())
    }
}

#[async_trait::async_trait]
impl InboundSource for UdpBroadcastSource {
    async fn next_event(&mut self) -> Result<Option<InboundEvent>> {
        loop {
            let (len, from) = self.socket.recv_from(&mut self.buf).await.map_err(|e| {
                FusionError::connection_failed_with_source("datagram receive failed", Box::new(e))
            })?;
            self.stats.received.fetch_add(1, Ordering::Relaxed);

            let Some(packet) = self.decoder.decode(&self.buf[..len]) else {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(len, from = %from, "datagram dropped");
                continue;
            };
            trace!(len, kind = ?packet.confidence(), "datagram decoded");
            if let Some(event) = self.route(packet) {
                return Ok(Some(event));
            }
        }
    }

    fn source_id(&self) -> SourceId {
        SourceId::Broadcasting
    }
}

/// `u32` LE message type followed by `u32` LE connection id.
pub fn connection_request(connection_id: u32) -> [u8; 8] {
    let mut request = [0u8; 8];
    request[..4].copy_from_slice(&CONNECTION_REQUEST.to_le_bytes());
    request[4..].copy_from_slice(&connection_id.to_le_bytes());
    request
}
