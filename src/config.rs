//! Link configuration
//!
//! A [`LinkConfig`] is built explicitly and handed to
//! [`ControlSession::start`](crate::ControlSession::start). It can be loaded
//! from YAML; every key is optional and falls back to the defaults below.
//!
//! ```yaml
//! remote_addr: 192.168.1.5:3010
//! local_addr: 0.0.0.0:3010
//! aux_period_ms: 64
//! sample_queue: 16
//! telemetry_buffer: 64
//! header_mismatch: publish
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{LinkError, Result};

/// Default vehicle address.
pub const DEFAULT_REMOTE_ADDR: ([u8; 4], u16) = ([192, 168, 1, 5], 3010);
/// Default local telemetry port.
pub const DEFAULT_LOCAL_PORT: u16 = 3010;
/// Default heartbeat period for AuxControl frames.
pub const DEFAULT_AUX_PERIOD_MS: u64 = 64;

/// What to publish when a telemetry datagram has the wrong header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMismatchPolicy {
    /// Publish a [`TelemetryFrame::rejected`](crate::TelemetryFrame::rejected)
    /// placeholder so consumers see one notification per datagram.
    ///
    /// The placeholder also replaces the latest frame seen by
    /// `latest_telemetry()` and `subscribe_telemetry()`, so a single bad
    /// datagram hides the last good reading. Check
    /// [`TelemetryFrame::is_valid`](crate::TelemetryFrame::is_valid) before
    /// displaying values.
    #[default]
    Publish,
    /// Log and drop the datagram.
    Suppress,
}

/// Configuration for one control session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Vehicle endpoint for Control and AuxControl datagrams
    pub remote_addr: SocketAddr,
    /// Local endpoint telemetry is received on
    pub local_addr: SocketAddr,
    /// AuxControl heartbeat period in milliseconds
    pub aux_period_ms: u64,
    /// Joystick samples queued for the control task before new ones are dropped
    pub sample_queue: usize,
    /// Telemetry notifications buffered per subscriber before it lags
    pub telemetry_buffer: usize,
    pub header_mismatch: HeaderMismatchPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            remote_addr: SocketAddr::from(DEFAULT_REMOTE_ADDR),
            local_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LOCAL_PORT)),
            aux_period_ms: DEFAULT_AUX_PERIOD_MS,
            sample_queue: 16,
            telemetry_buffer: 64,
            header_mismatch: HeaderMismatchPolicy::default(),
        }
    }
}

impl LinkConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading link configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| LinkError::ConfigFile { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the link cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.aux_period_ms == 0 {
            return Err(LinkError::config("aux_period_ms must be greater than zero"));
        }
        if self.sample_queue == 0 {
            return Err(LinkError::config("sample_queue must be greater than zero"));
        }
        if self.telemetry_buffer == 0 {
            return Err(LinkError::config("telemetry_buffer must be greater than zero"));
        }
        if self.remote_addr.port() == 0 {
            return Err(LinkError::config("remote_addr needs a non-zero port"));
        }
        if self.remote_addr.ip().is_unspecified() {
            return Err(LinkError::config("remote_addr cannot be an unspecified address"));
        }
        Ok(())
    }

    /// Heartbeat period as a [`Duration`].
    pub fn aux_period(&self) -> Duration {
        Duration::from_millis(self.aux_period_ms)
    }
}
