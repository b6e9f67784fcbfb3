//! Concrete inbound sources

pub mod udp;

pub use udp::{UdpBroadcastSource, UdpStats};
