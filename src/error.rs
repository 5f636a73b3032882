//! Error types for the control/telemetry link.
//!
//! Every error in this crate is recoverable from the point of view of the
//! control loop: a bad datagram is dropped, a failed send is superseded by the
//! next heartbeat or joystick sample. Nothing is retried at the protocol layer.
//!
//! ## Error Categories
//!
//! - **Frame Errors**: inbound datagrams with the wrong header byte or length
//! - **I/O Errors**: socket bind, send and receive failures
//! - **Configuration Errors**: invalid or unreadable [`LinkConfig`](crate::LinkConfig)
//! - **Session Errors**: sample queue full or session already shut down
//!
//! ```rust
//! use rovlink::LinkError;
//!
//! let error = LinkError::malformed_frame("telemetry", 34, 12);
//! assert!(error.is_transient());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Header mismatch: expected {expected:#04x}, found {found:#04x}")]
    HeaderMismatch { expected: u8, found: u8 },

    #[error("Malformed {kind} frame: expected {expected} bytes, found {found}")]
    MalformedFrame { kind: &'static str, expected: usize, found: usize },

    #[error("Socket error during {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample queue full, dropped sample ({capacity} pending)")]
    Backpressure { capacity: usize },

    #[error("Control session is closed")]
    SessionClosed,
}

impl LinkError {
    /// Returns whether the link keeps running after this error.
    ///
    /// Transient errors are logged and the next scheduled send proceeds.
    /// Non-transient errors come from setup (bind, configuration) or from
    /// using a session after shutdown.
    pub fn is_transient(&self) -> bool {
        match self {
            LinkError::HeaderMismatch { .. } => true,
            LinkError::MalformedFrame { .. } => true,
            LinkError::Io { .. } => true,
            LinkError::Backpressure { .. } => true,
            LinkError::Config { .. } => false,
            LinkError::ConfigFile { .. } => false,
            LinkError::SessionClosed => false,
        }
    }

    /// Helper constructor for socket errors with operation context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        LinkError::Io { context: context.into(), source }
    }

    /// Helper constructor for length mismatches.
    pub fn malformed_frame(kind: &'static str, expected: usize, found: usize) -> Self {
        LinkError::MalformedFrame { kind, expected, found }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        LinkError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Io { context: "<unknown>".to_string(), source: err }
    }
}

impl From<serde_yaml_ng::Error> for LinkError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        LinkError::Config { reason: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn header_mismatch_message_names_both_bytes(expected in any::<u8>(), found in any::<u8>()) {
            let msg = LinkError::HeaderMismatch { expected, found }.to_string();
            let expected_hex = format!("{:#04x}", expected);
            let found_hex = format!("{:#04x}", found);
            prop_assert!(msg.contains(&expected_hex));
            prop_assert!(msg.contains(&found_hex));
        }

        #[test]
        fn malformed_frame_message_names_lengths(expected in 0usize..256, found in 0usize..65536) {
            let msg = LinkError::malformed_frame("telemetry", expected, found).to_string();
            prop_assert!(msg.contains("telemetry"));
            prop_assert!(msg.contains(&expected.to_string()));
            prop_assert!(msg.contains(&found.to_string()));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();

        let error = LinkError::config("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn transient_classification() {
        assert!(LinkError::HeaderMismatch { expected: 0xAE, found: 0 }.is_transient());
        assert!(LinkError::malformed_frame("telemetry", 34, 3).is_transient());
        assert!(LinkError::Backpressure { capacity: 4 }.is_transient());
        assert!(
            LinkError::io("send", std::io::Error::from(std::io::ErrorKind::WouldBlock))
                .is_transient()
        );
        assert!(!LinkError::config("bad port").is_transient());
        assert!(!LinkError::SessionClosed.is_transient());
    }

    #[test]
    fn io_error_keeps_source() {
        let err: LinkError =
            std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "unreachable").into();
        let source = std::error::Error::source(&err).expect("io error has a source");
        assert_eq!(source.to_string(), "unreachable");
    }
}
