//! Control station link for a tethered underwater vehicle.
//!
//! rovlink turns joystick samples and operator settings into the binary
//! datagrams the vehicle firmware expects, and decodes the telemetry it sends
//! back.
//!
//! # Features
//!
//! - **Wire codec**: fixed-layout Control, AuxControl and Telemetry records
//! - **Mixing**: six joystick axes into eight thruster powers, with per-thruster overrides
//! - **Shared state**: setters callable from any thread, one lock per field
//! - **Link tasks**: 64 ms aux heartbeat, per-sample control, async telemetry receive
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rovlink::{Axis, ControlSession, JoystickSample, LinkConfig, UpdateRate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ControlSession::start(LinkConfig::default()).await?;
//!     session.set_depth(2.0);
//!
//!     session.submit_sample(JoystickSample::neutral().with_axis(Axis::Longitudinal, 60))?;
//!
//!     let mut telemetry = session.subscribe_telemetry(UpdateRate::Max(10));
//!     while let Some(frame) = telemetry.next().await {
//!         println!("depth {:.2} m, {:.1} V", frame.depth, frame.voltage);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
mod error;
pub mod mixing;
pub mod state;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Link runtime
pub mod driver;
pub mod session;
pub mod stream;
pub mod transport;

pub use config::{HeaderMismatchPolicy, LinkConfig};
pub use driver::LinkStatsSnapshot;
pub use error::*;
pub use mixing::{CameraSelectEdgeState, mix};
pub use session::ControlSession;
pub use state::SharedControlState;
pub use transport::{Transport, UdpLink};
pub use types::*;
