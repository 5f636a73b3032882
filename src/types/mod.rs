//! Core types for the control/telemetry link.
//!
//! This module provides the in-memory forms of everything that crosses the link:
//! - [`JoystickSample`] is the normalized input consumed from the joystick collaborator
//! - [`ControlFrame`], [`AuxTarget`] and [`TelemetryFrame`] mirror the three wire records
//! - [`ThrusterOverride`] holds operator-set thruster powers that bypass mixing
//! - [`AuxFlags`] and [`ThrusterMask`] are the bit-packed flag fields
//!
//! ## Usage Example
//!
//! ```rust
//! use rovlink::types::{ThrusterMask, ThrusterOverride};
//!
//! let overrides = ThrusterOverride {
//!     enabled: true,
//!     powers: [10, -10, 0, 0, 0, 0, 0, 0],
//!     invert: ThrusterMask::new(0b0000_0001),
//! };
//! assert_eq!(overrides.effective_powers()[..2], [-10, -10]);
//! ```

mod flags;
mod frames;
mod joystick;
mod update_rate;

// Re-export all public types
pub use flags::{AuxAxis, AuxFlags, ThrusterMask};
pub use frames::{
    AUX_HEADER, AuxTarget, CONTROL_HEADER, ControlFrame, PROTOCOL_VERSION, TELEMETRY_HEADER,
    THRUSTER_COUNT, THRUSTER_LIMIT, THRUSTER_SLOTS, TelemetryFrame, ThrusterOverride, clamp_power,
    clamp_unit,
};
pub use joystick::{AXIS_COUNT, Axis, AxisDirection, JoystickButtons, JoystickSample};
pub use update_rate::UpdateRate;
