//! Error types for the fusion runtime.
//!
//! The decoding, normalization and merge paths are total: they degrade to
//! `None` or documented defaults instead of failing. Errors only surface at
//! the edges of the crate, where sockets are bound, configuration is loaded
//! and channels between tasks are used.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: UDP bind or handshake failures
//! - **File Errors**: configuration files that cannot be read
//! - **Parse Errors**: configuration documents that cannot be parsed
//! - **Config Errors**: configuration values that fail validation
//! - **Channel Errors**: the driver task has stopped
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use slipstream::FusionError;
//!
//! let error = FusionError::connection_failed("port 9996 already bound");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fusion operations.
pub type Result<T, E = FusionError> = std::result::Result<T, E>;

/// Main error type for the fusion runtime.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FusionError {
    #[error("Broadcast connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid configuration for '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("Channel closed: {context}")]
    ChannelClosed { context: String },
}

impl FusionError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FusionError::Connection { .. } => true,
            FusionError::File { .. } => false,
            FusionError::Parse { .. } => false,
            FusionError::Config { .. } => false,
            FusionError::ChannelClosed { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            FusionError::Connection { .. } => vec![
                "Check that no other application is bound to the broadcast port",
                "Enable UDP broadcasting in the simulator settings",
                "Verify the configured peer port matches the simulator",
            ],
            FusionError::File { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            FusionError::Parse { .. } => vec![
                "Check the configuration file is valid YAML",
                "Compare field names against the documented defaults",
            ],
            FusionError::Config { .. } => vec![
                "Use a non-zero value for timeouts, intervals and buffers",
                "Use different values for the primary and fallback ports",
            ],
            FusionError::ChannelClosed { .. } => vec![
                "Keep the connection alive while pushing feed records",
                "Restart the fusion runtime",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        FusionError::File { path, source }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        FusionError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        FusionError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration validation errors.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FusionError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for closed channel errors.
    pub fn channel_closed(context: impl Into<String>) -> Self {
        FusionError::ChannelClosed { context: context.into() }
    }
}

impl From<std::io::Error> for FusionError {
    fn from(err: std::io::Error) -> Self {
        FusionError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_carry_their_context(
                reason in ".*",
                field in "\\w+",
                details in ".*",
            ) {
                let connection = FusionError::connection_failed(reason.clone());
                let config = FusionError::invalid_config(field.clone(), reason.clone());
                let parse = FusionError::Parse { context: "config".to_string(), details: details.clone() };

                prop_assert!(connection.to_string().contains(&reason));
                prop_assert!(config.to_string().contains(&field));
                prop_assert!(parse.to_string().contains(&details));
            }

            #[test]
            fn io_errors_convert_to_file_errors(message in ".*") {
                let converted: FusionError = std::io::Error::other(message.clone()).into();
                match converted {
                    FusionError::File { source, .. } => prop_assert_eq!(source.to_string(), message),
                    other => prop_assert!(false, "unexpected variant: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<FusionError>();

        let error = FusionError::channel_closed("driver stopped");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(FusionError::connection_failed("bind").is_retryable());
        assert!(!FusionError::invalid_config("port", "zero").is_retryable());
        assert!(!FusionError::channel_closed("driver").is_retryable());
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = [
            FusionError::connection_failed("bind"),
            FusionError::file_error(PathBuf::from("fusion.yaml"), std::io::Error::other("gone")),
            FusionError::Parse { context: "yaml".into(), details: "bad".into() },
            FusionError::invalid_config("tick_interval_ms", "must be non-zero"),
            FusionError::channel_closed("inbound"),
        ];

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "{error} has no suggestions");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn connection_errors_chain_their_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let error = FusionError::connection_failed_with_source("bind 9996", Box::new(inner));
        let source = std::error::Error::source(&error).expect("source should be kept");
        assert_eq!(source.to_string(), "in use");
    }
}
