//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```rust
//! use slipstream::FusionConfig;
//!
//! let config = FusionConfig::from_yaml_str("udp:\n  port: 9100\n").unwrap();
//! assert_eq!(config.udp.port, 9100);
//! assert_eq!(config.udp.fallback_port, 9997);
//! assert_eq!(config.liveness_timeout_ms, 5000);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::adapters::SchemaVersion;
use crate::{FusionError, Result};

/// Top-level configuration of the fusion runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// A source with no accepted sample for longer than this is disconnected
    pub liveness_timeout_ms: u64,
    /// Minimum snapshot re-emit cadence
    pub tick_interval_ms: u64,
    /// Capacity of the inbound event channel
    pub event_buffer: usize,
    /// Field naming used by the memory-feed collaborator
    pub memory_schema: SchemaVersion,
    pub udp: UdpConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            liveness_timeout_ms: 5000,
            tick_interval_ms: 50,
            event_buffer: 256,
            memory_schema: SchemaVersion::V1,
            udp: UdpConfig::default(),
        }
    }
}

/// Raw-datagram broadcast listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    pub enabled: bool,
    pub bind_host: String,
    pub port: u16,
    /// Tried once when `port` is already bound
    pub fallback_port: u16,
    /// Simulator port receiving the connection request
    pub peer_port: u16,
    pub connection_id: u32,
    pub max_datagram: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_host: "127.0.0.1".to_owned(),
            port: 9996,
            fallback_port: 9997,
            peer_port: 9995,
            connection_id: std::process::id(),
            max_datagram: 1500,
        }
    }
}

impl FusionConfig {
    /// Parse a YAML document. Missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: FusionConfig = if yaml.trim().is_empty() {
            FusionConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml).map_err(|e| FusionError::Parse {
                context: "fusion configuration".to_string(),
                details: e.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| FusionError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.liveness_timeout_ms == 0 {
            return Err(FusionError::invalid_config("liveness_timeout_ms", "must be non-zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(FusionError::invalid_config("tick_interval_ms", "must be non-zero"));
        }
        if self.event_buffer == 0 {
            return Err(FusionError::invalid_config("event_buffer", "must be non-zero"));
        }
        if self.udp.enabled {
            if self.udp.port == self.udp.fallback_port {
                return Err(FusionError::invalid_config(
                    "udp.fallback_port",
                    format!("must differ from udp.port ({})", self.udp.port),
                ));
            }
            if self.udp.max_datagram < crate::decoder::MIN_PACKET_LEN {
                return Err(FusionError::invalid_config(
                    "udp.max_datagram",
                    format!("must be at least {} bytes", crate::decoder::MIN_PACKET_LEN),
                ));
            }
        }
        Ok(())
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Snapshot publications per second guaranteed by the tick alone.
    pub fn tick_hz(&self) -> f64 {
        1000.0 / self.tick_interval_ms.max(1) as f64
    }
}
