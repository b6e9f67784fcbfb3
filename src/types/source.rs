//! Source identity, liveness and protocol labels.

use serde::{Deserialize, Serialize};

/// The two telemetry sources the engine fuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Push-style memory feed (source A)
    SharedMemory,
    /// Network broadcast feed (source B)
    Broadcasting,
}

impl SourceId {
    /// Both sources in tie-break order.
    pub const ALL: [SourceId; 2] = [SourceId::SharedMemory, SourceId::Broadcasting];

    /// Stable label used in logs and serialized output.
    pub fn label(self) -> &'static str {
        match self {
            SourceId::SharedMemory => "shared_memory",
            SourceId::Broadcasting => "broadcasting",
        }
    }

    /// The other source.
    pub fn other(self) -> SourceId {
        match self {
            SourceId::SharedMemory => SourceId::Broadcasting,
            SourceId::Broadcasting => SourceId::SharedMemory,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SourceId::SharedMemory => 0,
            SourceId::Broadcasting => 1,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How much a value can be trusted given the path it was decoded through.
///
/// Ordered from least to most trustworthy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Guessed by scanning byte offsets of an unrecognized datagram
    Heuristic,
    /// Read at fixed offsets of a recognized datagram
    Decoded,
    /// Delivered as named fields by a structured client or the memory feed
    #[default]
    Structured,
}

/// Connectivity state machine of one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No data has ever been received
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Liveness of one source as exposed to consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SourceLiveness {
    pub connected: bool,
    pub state: LinkState,
    /// Wall-clock time of the last accepted sample, milliseconds since the
    /// Unix epoch. `0` when nothing was ever received.
    pub last_update_at_ms: u64,
    /// `0..=100`
    pub quality_score: u8,
}

/// Liveness of both sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LivenessReport {
    pub shared_memory: SourceLiveness,
    pub broadcasting: SourceLiveness,
}

impl LivenessReport {
    pub fn get(&self, source: SourceId) -> &SourceLiveness {
        match source {
            SourceId::SharedMemory => &self.shared_memory,
            SourceId::Broadcasting => &self.broadcasting,
        }
    }
}

/// Which sources currently feed the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum ActiveProtocol {
    #[default]
    None,
    SharedMemory,
    Broadcasting,
    Hybrid,
}

impl ActiveProtocol {
    /// Derive the label from the two connection flags.
    pub fn from_connections(shared_memory: bool, broadcasting: bool) -> Self {
        match (shared_memory, broadcasting) {
            (true, true) => ActiveProtocol::Hybrid,
            (true, false) => ActiveProtocol::SharedMemory,
            (false, true) => ActiveProtocol::Broadcasting,
            (false, false) => ActiveProtocol::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActiveProtocol::None => "none",
            ActiveProtocol::SharedMemory => "shared_memory",
            ActiveProtocol::Broadcasting => "broadcasting",
            ActiveProtocol::Hybrid => "hybrid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_label_truth_table() {
        assert_eq!(ActiveProtocol::from_connections(true, true), ActiveProtocol::Hybrid);
        assert_eq!(ActiveProtocol::from_connections(true, false), ActiveProtocol::SharedMemory);
        assert_eq!(ActiveProtocol::from_connections(false, true), ActiveProtocol::Broadcasting);
        assert_eq!(ActiveProtocol::from_connections(false, false), ActiveProtocol::None);
    }

    #[test]
    fn confidence_orders_heuristic_lowest() {
        assert!(Confidence::Heuristic < Confidence::Decoded);
        assert!(Confidence::Decoded < Confidence::Structured);
    }

    #[test]
    fn labels_serialize_in_snake_case() {
        let json = serde_json::to_string(&ActiveProtocol::SharedMemory).unwrap();
        assert_eq!(json, "\"shared_memory\"");
        assert_eq!(serde_json::to_string(&SourceId::Broadcasting).unwrap(), "\"broadcasting\"");
    }
}
