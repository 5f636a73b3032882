//! Driver spawns and manages the link tasks

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::{self, MAX_FRAME_SIZE};
use crate::config::{HeaderMismatchPolicy, LinkConfig};
use crate::mixing::{self, CameraSelectEdgeState};
use crate::state::SharedControlState;
use crate::transport::Transport;
use crate::types::{ControlFrame, JoystickSample, TelemetryFrame};
use crate::{LinkError, Result};

/// Receive buffer size. Larger than any record so oversized datagrams are
/// seen at their real length and rejected as malformed.
const RECV_BUFFER_SIZE: usize = MAX_FRAME_SIZE * 16;

/// Longest pause after repeated receive errors.
const MAX_RECV_BACKOFF: Duration = Duration::from_millis(800);

/// Pause after `consecutive` receive errors in a row.
///
/// Exponential backoff: 25ms, 50ms, 100ms, ... capped at [`MAX_RECV_BACKOFF`].
fn recv_backoff(consecutive: u32) -> Duration {
    let exponent = consecutive.saturating_sub(1).min(5);
    Duration::from_millis(25 << exponent).min(MAX_RECV_BACKOFF)
}

/// Counters for one link, updated by the driver tasks.
#[derive(Debug, Default)]
pub struct LinkStats {
    control_sent: AtomicU64,
    aux_sent: AtomicU64,
    send_errors: AtomicU64,
    telemetry_received: AtomicU64,
    header_mismatches: AtomicU64,
    malformed_frames: AtomicU64,
    recv_errors: AtomicU64,
    samples_dropped: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatsSnapshot {
    pub control_sent: u64,
    pub aux_sent: u64,
    pub send_errors: u64,
    pub telemetry_received: u64,
    pub header_mismatches: u64,
    pub malformed_frames: u64,
    pub recv_errors: u64,
    pub samples_dropped: u64,
}

impl LinkStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sample_dropped(&self) {
        Self::bump(&self.samples_dropped);
    }

    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            control_sent: self.control_sent.load(Ordering::Relaxed),
            aux_sent: self.aux_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            telemetry_received: self.telemetry_received.load(Ordering::Relaxed),
            header_mismatches: self.header_mismatches.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Result of spawning driver tasks
pub struct DriverChannels {
    /// Joystick samples for the control task
    pub samples: mpsc::Sender<JoystickSample>,
    /// One notification per inbound telemetry datagram
    pub telemetry: broadcast::Sender<TelemetryFrame>,
    /// Most recent telemetry notification
    pub latest_telemetry: watch::Receiver<Option<TelemetryFrame>>,
    /// Most recent control frame handed to the transport
    pub last_control: watch::Receiver<Option<ControlFrame>>,
    pub stats: Arc<LinkStats>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    pub tasks: Vec<JoinHandle<()>>,
}

/// Sends that fail back to back are reported once at `warn` level, then at
/// `debug` until a send succeeds again.
#[derive(Debug, Default)]
struct SendFailures {
    consecutive: u32,
}

impl SendFailures {
    fn record(&mut self, stats: &LinkStats, kind: &str, result: Result<usize>) -> bool {
        match result {
            Ok(_) => {
                if self.consecutive > 0 {
                    info!("{} sends recovered after {} failures", kind, self.consecutive);
                }
                self.consecutive = 0;
                true
            }
            Err(e) => {
                LinkStats::bump(&stats.send_errors);
                self.consecutive += 1;
                if self.consecutive == 1 {
                    warn!("{} send failed: {}", kind, e);
                } else {
                    debug!("{} send failed ({} in a row): {}", kind, self.consecutive, e);
                }
                false
            }
        }
    }
}

/// Driver spawns and manages the link tasks
///
/// Three tasks share one transport:
/// - heartbeat: encodes the aux bundle on every tick of a fixed interval
/// - control: mixes and sends one Control frame per joystick sample
/// - telemetry: receives, decodes and publishes inbound datagrams
///
/// All three stop when the returned cancellation token is cancelled.
pub struct Driver;

impl Driver {
    /// Spawn driver tasks on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        state: Arc<SharedControlState>,
        config: &LinkConfig,
    ) -> DriverChannels {
        let (sample_tx, sample_rx) = mpsc::channel(config.sample_queue);
        let (telemetry_tx, _) = broadcast::channel(config.telemetry_buffer);
        let (latest_tx, latest_rx) = watch::channel(None);
        let (control_tx, control_rx) = watch::channel(None);
        let stats = Arc::new(LinkStats::default());
        let cancel = CancellationToken::new();

        let heartbeat = tokio::spawn(Self::heartbeat_task(
            Arc::clone(&transport),
            Arc::clone(&state),
            config.aux_period(),
            Arc::clone(&stats),
            cancel.clone(),
        ));

        let control = tokio::spawn(Self::control_task(
            Arc::clone(&transport),
            state,
            sample_rx,
            control_tx,
            Arc::clone(&stats),
            cancel.clone(),
        ));

        let telemetry = tokio::spawn(Self::telemetry_task(
            transport,
            telemetry_tx.clone(),
            latest_tx,
            config.header_mismatch,
            Arc::clone(&stats),
            cancel.clone(),
        ));

        DriverChannels {
            samples: sample_tx,
            telemetry: telemetry_tx,
            latest_telemetry: latest_rx,
            last_control: control_rx,
            stats,
            cancel,
            tasks: vec![heartbeat, control, telemetry],
        }
    }

    /// Heartbeat task - sends the aux bundle every period, changed or not
    async fn heartbeat_task(
        transport: Arc<dyn Transport>,
        state: Arc<SharedControlState>,
        period: Duration,
        stats: Arc<LinkStats>,
        cancel: CancellationToken,
    ) {
        info!("Aux heartbeat started ({:?} period)", period);
        let mut ticker = interval(period);
        // A stalled runtime should not produce a burst of stale heartbeats
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = SendFailures::default();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let aux = state.aux_snapshot();
            let datagram = codec::encode_aux(&aux);
            let result = transport.send(&datagram).await;
            if failures.record(&stats, "Aux", result) {
                LinkStats::bump(&stats.aux_sent);
                trace!(flags = aux.flags.bits(), depth = aux.depth, "Aux frame sent");
            }
        }

        info!("Aux heartbeat stopped");
    }

    /// Control task - one Control frame per joystick sample, no throttling
    async fn control_task(
        transport: Arc<dyn Transport>,
        state: Arc<SharedControlState>,
        mut samples: mpsc::Receiver<JoystickSample>,
        last_control: watch::Sender<Option<ControlFrame>>,
        stats: Arc<LinkStats>,
        cancel: CancellationToken,
    ) {
        info!("Control task started");
        let mut edge = CameraSelectEdgeState::new();
        let mut failures = SendFailures::default();

        loop {
            let sample = tokio::select! {
                _ = cancel.cancelled() => break,
                sample = samples.recv() => match sample {
                    Some(sample) => sample,
                    None => {
                        debug!("Sample channel closed");
                        break;
                    }
                },
            };

            let overrides = state.override_snapshot();
            let frame = mixing::mix(&sample, &overrides, &mut edge);
            let datagram = codec::encode_control(&frame);
            last_control.send_replace(Some(frame));

            let result = transport.send(&datagram).await;
            if failures.record(&stats, "Control", result) {
                LinkStats::bump(&stats.control_sent);
                trace!(thrusters = ?frame.thrusters, overridden = overrides.enabled, "Control frame sent");
            }
        }

        info!("Control task stopped");
    }

    /// Telemetry task - decodes inbound datagrams in arrival order
    async fn telemetry_task(
        transport: Arc<dyn Transport>,
        telemetry: broadcast::Sender<TelemetryFrame>,
        latest: watch::Sender<Option<TelemetryFrame>>,
        policy: HeaderMismatchPolicy,
        stats: Arc<LinkStats>,
        cancel: CancellationToken,
    ) {
        info!("Telemetry receiver started");
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut error_count = 0u32;

        let publish = |frame: TelemetryFrame| {
            latest.send_replace(Some(frame));
            // No subscribers is fine; the watch channel still holds the latest frame
            let _ = telemetry.send(frame);
        };

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = transport.recv(&mut buf) => received,
            };

            let len = match received {
                Ok(len) => {
                    error_count = 0;
                    len
                }
                Err(e) => {
                    LinkStats::bump(&stats.recv_errors);
                    error_count = error_count.saturating_add(1);
                    warn!("Telemetry receive error ({} in a row): {}", error_count, e);
                    let backoff = recv_backoff(error_count);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => continue,
                    }
                }
            };

            match codec::decode_telemetry(&buf[..len]) {
                Ok(frame) => {
                    LinkStats::bump(&stats.telemetry_received);
                    publish(frame);
                }
                Err(LinkError::HeaderMismatch { expected, found }) => {
                    LinkStats::bump(&stats.header_mismatches);
                    warn!("Wrong telemetry header ({:#010b} vs {:#010b})", found, expected);
                    if policy == HeaderMismatchPolicy::Publish {
                        publish(TelemetryFrame::rejected(found));
                    }
                }
                Err(e) => {
                    LinkStats::bump(&stats.malformed_frames);
                    warn!("Dropping telemetry datagram: {}", e);
                }
            }
        }

        info!("Telemetry receiver stopped");
    }
}
