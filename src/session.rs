//! Control session: the operator-facing handle for one vehicle link

use futures::{Stream, StreamExt, stream::BoxStream};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::driver::{Driver, LinkStats, LinkStatsSnapshot};
use crate::state::SharedControlState;
use crate::stream::ThrottleExt;
use crate::transport::{Transport, UdpLink};
use crate::types::{
    AuxAxis, AuxFlags, ControlFrame, JoystickSample, TelemetryFrame, ThrusterMask, UpdateRate,
};
use crate::{LinkError, Result};

/// A running link to one vehicle.
///
/// Owns the shared control state and the driver tasks. Setters can be called
/// from any thread without awaiting; the next Control or AuxControl frame
/// picks the change up. Dropping the session cancels all tasks.
pub struct ControlSession {
    state: Arc<SharedControlState>,
    transport: Arc<dyn Transport>,
    samples: mpsc::Sender<JoystickSample>,
    telemetry: broadcast::Sender<TelemetryFrame>,
    latest_telemetry: watch::Receiver<Option<TelemetryFrame>>,
    last_control: watch::Receiver<Option<ControlFrame>>,
    stats: Arc<LinkStats>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    config: LinkConfig,
}

impl ControlSession {
    /// Bind the UDP link described by `config` and start the link tasks.
    pub async fn start(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        let link = UdpLink::bind(config.local_addr, config.remote_addr).await?;
        Self::start_with_transport(config, Arc::new(link))
    }

    /// Start the link tasks over an existing transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with_transport(config: LinkConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(SharedControlState::new());
        let channels = Driver::spawn(Arc::clone(&transport), Arc::clone(&state), &config);

        info!(
            remote = %transport.remote_addr(),
            aux_period_ms = config.aux_period_ms,
            "Control session started"
        );

        Ok(Self {
            state,
            transport,
            samples: channels.samples,
            telemetry: channels.telemetry,
            latest_telemetry: channels.latest_telemetry,
            last_control: channels.last_control,
            stats: channels.stats,
            cancel: channels.cancel,
            tasks: channels.tasks,
            config,
        })
    }

    /// Queue a joystick sample for mixing and sending.
    ///
    /// Never waits. When the control task is behind, the sample is dropped and
    /// [`LinkError::Backpressure`] is returned; the next sample supersedes it.
    pub fn submit_sample(&self, sample: JoystickSample) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(LinkError::SessionClosed);
        }
        match self.samples.try_send(sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.stats.record_sample_dropped();
                debug!("Sample queue full, dropping joystick sample");
                Err(LinkError::Backpressure { capacity: self.config.sample_queue })
            }
            Err(TrySendError::Closed(_)) => Err(LinkError::SessionClosed),
        }
    }

    pub fn set_override_enabled(&self, enabled: bool) {
        self.state.set_override_enabled(enabled);
    }

    pub fn set_override_powers(&self, powers: &[i8]) {
        self.state.set_override_powers(powers);
    }

    pub fn set_override_power(&self, thruster: usize, power: i8) {
        self.state.set_override_power(thruster, power);
    }

    pub fn set_override_invert(&self, mask: ThrusterMask) {
        self.state.set_override_invert(mask);
    }

    pub fn set_aux_target(&self, axis: AuxAxis, value: f64) {
        self.state.set_aux_target(axis, value);
    }

    pub fn set_aux_enabled(&self, axis: AuxAxis, enabled: bool) {
        self.state.set_aux_enabled(axis, enabled);
    }

    pub fn set_aux_flags(&self, flags: AuxFlags) {
        self.state.set_aux_flags(flags);
    }

    pub fn set_depth(&self, value: f64) {
        self.state.set_depth(value);
    }

    pub fn set_yaw(&self, value: f64) {
        self.state.set_yaw(value);
    }

    pub fn set_roll(&self, value: f64) {
        self.state.set_roll(value);
    }

    pub fn set_pitch(&self, value: f64) {
        self.state.set_pitch(value);
    }

    /// Shared state handle for UI code that outlives a borrow of the session.
    pub fn state(&self) -> Arc<SharedControlState> {
        Arc::clone(&self.state)
    }

    /// One item per inbound telemetry datagram, in arrival order.
    ///
    /// A subscriber that falls more than `telemetry_buffer` frames behind
    /// skips the frames it missed.
    pub fn telemetry_updates(&self) -> impl Stream<Item = TelemetryFrame> + 'static {
        BroadcastStream::new(self.telemetry.subscribe()).filter_map(|item| async move {
            match item {
                Ok(frame) => Some(frame),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("Telemetry subscriber lagged, skipped {} frames", skipped);
                    None
                }
            }
        })
    }

    /// Latest telemetry at the requested rate.
    ///
    /// Starts with the current frame if one has arrived. With
    /// [`UpdateRate::Max`] intermediate frames are dropped, latest wins.
    pub fn subscribe_telemetry(&self, rate: UpdateRate) -> BoxStream<'static, TelemetryFrame> {
        let frames =
            WatchStream::new(self.latest_telemetry.clone()).filter_map(|opt| async move { opt });

        match rate.throttle_interval() {
            None => frames.boxed(),
            Some(interval) => frames.throttle(interval).boxed(),
        }
    }

    /// Most recent telemetry notification, if any.
    ///
    /// Under [`HeaderMismatchPolicy::Publish`](crate::HeaderMismatchPolicy::Publish)
    /// this can be a rejected placeholder; see [`TelemetryFrame::is_valid`].
    pub fn latest_telemetry(&self) -> Option<TelemetryFrame> {
        *self.latest_telemetry.borrow()
    }

    /// Most recent Control frame handed to the transport.
    pub fn last_control(&self) -> Option<ControlFrame> {
        *self.last_control.borrow()
    }

    pub fn stats(&self) -> LinkStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.transport.remote_addr()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Stop all link tasks and wait for them to finish.
    ///
    /// Further calls to [`submit_sample`](Self::submit_sample) return
    /// [`LinkError::SessionClosed`].
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Link task ended abnormally: {}", e);
            }
        }
        info!("Control session stopped");
    }
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        debug!("Dropping control session");
        self.cancel.cancel();
    }
}
