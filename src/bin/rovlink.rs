//! Headless link monitor.
//!
//! Binds the link, keeps the aux heartbeat running with neutral stick input and
//! logs telemetry until interrupted.
//!
//! ```text
//! rovlink [config.yaml]
//! RUST_LOG=rovlink=debug rovlink
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use rovlink::{ControlSession, JoystickSample, LinkConfig, LinkError, UpdateRate};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Neutral samples keep the vehicle's control watchdog fed.
const NEUTRAL_SAMPLE_PERIOD: Duration = Duration::from_millis(100);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => LinkConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => LinkConfig::default(),
    };

    let mut session = ControlSession::start(config).await.context("starting control session")?;
    info!(local = ?session.local_addr().ok(), remote = %session.remote_addr(), "Monitoring link");

    let mut telemetry = session.subscribe_telemetry(UpdateRate::Max(2));
    let mut ticker = tokio::time::interval(NEUTRAL_SAMPLE_PERIOD);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => match session.submit_sample(JoystickSample::neutral()) {
                Ok(()) | Err(LinkError::Backpressure { .. }) => {}
                Err(e) => {
                    warn!("Stopping: {}", e);
                    break;
                }
            },
            Some(frame) = telemetry.next() => {
                if frame.is_valid() {
                    info!(
                        depth = frame.depth,
                        pitch = frame.pitch,
                        yaw = frame.yaw,
                        roll = frame.roll,
                        current = frame.current,
                        voltage = frame.voltage,
                        camera = frame.camera_index,
                        temperature = frame.temperature,
                        "Telemetry"
                    );
                } else {
                    warn!(header = frame.header, "Rejected telemetry datagram");
                }
            }
        }
    }

    session.shutdown().await;
    let stats = session.stats();
    info!(
        control_sent = stats.control_sent,
        aux_sent = stats.aux_sent,
        telemetry_received = stats.telemetry_received,
        send_errors = stats.send_errors,
        "Link closed"
    );
    Ok(())
}
