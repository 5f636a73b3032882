//! Frame types exchanged with the vehicle
//!
//! These are the in-memory forms of the three wire records. The byte layout
//! lives in [`crate::codec`]; the types here only know their field ranges.

use serde::{Deserialize, Serialize};

use super::flags::{AuxAxis, AuxFlags, ThrusterMask};

/// Leading byte of a Control frame.
pub const CONTROL_HEADER: u8 = 0xAC;
/// Leading byte of an AuxControl frame.
pub const AUX_HEADER: u8 = 0xAD;
/// Leading byte of a Telemetry frame.
pub const TELEMETRY_HEADER: u8 = 0xAE;
/// Control protocol version sent after the header.
pub const PROTOCOL_VERSION: i8 = 1;

/// Thrusters driven by the mixer.
pub const THRUSTER_COUNT: usize = 8;
/// Thruster slots reserved in the Control frame layout.
pub const THRUSTER_SLOTS: usize = 10;
/// Absolute power limit for a single thruster.
pub const THRUSTER_LIMIT: i8 = 100;

/// Clamp a thruster power into `[-100, 100]`.
pub fn clamp_power(value: i8) -> i8 {
    value.clamp(-THRUSTER_LIMIT, THRUSTER_LIMIT)
}

/// Clamp a manipulator or camera delta into `[-1, 1]`.
pub fn clamp_unit(value: i8) -> i8 {
    value.clamp(-1, 1)
}

/// Actuator command frame, rebuilt from scratch for every joystick sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrame {
    pub header: u8,
    pub version: i8,
    /// Thruster powers in `[-100, 100]`
    pub thrusters: [i8; THRUSTER_COUNT],
    /// Manipulator grip: 1 open, -1 close
    pub manipulator_grip: i8,
    /// Manipulator rotation: 1 counter-clockwise, -1 clockwise
    pub manipulator_rotate: i8,
    pub camera_pan: i8,
    pub camera_tilt: i8,
    pub camera_select: bool,
}

impl Default for ControlFrame {
    fn default() -> Self {
        Self {
            header: CONTROL_HEADER,
            version: PROTOCOL_VERSION,
            thrusters: [0; THRUSTER_COUNT],
            manipulator_grip: 0,
            manipulator_rotate: 0,
            camera_pan: 0,
            camera_tilt: 0,
            camera_select: false,
        }
    }
}

impl ControlFrame {
    /// Copy of this frame with every field forced into its declared range.
    pub fn clamped(&self) -> Self {
        let mut frame = *self;
        for power in &mut frame.thrusters {
            *power = clamp_power(*power);
        }
        frame.manipulator_grip = clamp_unit(frame.manipulator_grip);
        frame.manipulator_rotate = clamp_unit(frame.manipulator_rotate);
        frame.camera_pan = clamp_unit(frame.camera_pan);
        frame.camera_tilt = clamp_unit(frame.camera_tilt);
        frame
    }
}

/// Stabilization setpoints, sent on every heartbeat tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxTarget {
    pub header: u8,
    pub flags: AuxFlags,
    pub depth: f64,
    pub yaw: f64,
    pub roll: f64,
    pub pitch: f64,
}

impl Default for AuxTarget {
    fn default() -> Self {
        Self {
            header: AUX_HEADER,
            flags: AuxFlags::empty(),
            depth: 0.0,
            yaw: 0.0,
            roll: 0.0,
            pitch: 0.0,
        }
    }
}

impl AuxTarget {
    /// Setpoint for one axis.
    pub fn target(&self, axis: AuxAxis) -> f64 {
        match axis {
            AuxAxis::Depth => self.depth,
            AuxAxis::Yaw => self.yaw,
            AuxAxis::Roll => self.roll,
            AuxAxis::Pitch => self.pitch,
        }
    }

    pub fn set_target(&mut self, axis: AuxAxis, value: f64) {
        match axis {
            AuxAxis::Depth => self.depth = value,
            AuxAxis::Yaw => self.yaw = value,
            AuxAxis::Roll => self.roll = value,
            AuxAxis::Pitch => self.pitch = value,
        }
    }

    pub fn is_enabled(&self, axis: AuxAxis) -> bool {
        self.flags.contains(AuxFlags::for_axis(axis))
    }
}

/// Direct thruster powers that bypass axis mixing when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrusterOverride {
    pub enabled: bool,
    pub powers: [i8; THRUSTER_COUNT],
    pub invert: ThrusterMask,
}

impl ThrusterOverride {
    /// Powers with the invert mask applied.
    pub fn effective_powers(&self) -> [i8; THRUSTER_COUNT] {
        let mut out = [0i8; THRUSTER_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = clamp_power(self.powers[i]) * self.invert.sign(i);
        }
        out
    }
}

/// Vehicle state reported back over the link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub header: u8,
    pub version: i8,
    /// Meters below surface
    pub depth: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Amperes drawn by the vehicle
    pub current: f32,
    pub voltage: f32,
    pub camera_index: f32,
    /// Degrees Celsius
    pub temperature: f32,
}

impl Default for TelemetryFrame {
    fn default() -> Self {
        Self {
            header: TELEMETRY_HEADER,
            version: 0,
            depth: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            current: 0.0,
            voltage: 0.0,
            camera_index: 0.0,
            temperature: 0.0,
        }
    }
}

impl TelemetryFrame {
    /// Placeholder published for a datagram whose header did not match.
    ///
    /// Only `header` carries information (the byte that was received); all
    /// other fields are defaults and must not be trusted.
    pub fn rejected(found_header: u8) -> Self {
        Self { header: found_header, ..Self::default() }
    }

    /// Whether this frame came from a datagram with the telemetry header.
    pub fn is_valid(&self) -> bool {
        self.header == TELEMETRY_HEADER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_frame_clamped_limits_every_field() {
        let frame = ControlFrame {
            thrusters: [127, -128, 100, -100, 0, 50, -101, 101],
            manipulator_grip: 5,
            manipulator_rotate: -7,
            camera_pan: 2,
            camera_tilt: -3,
            ..ControlFrame::default()
        }
        .clamped();

        assert_eq!(frame.thrusters, [100, -100, 100, -100, 0, 50, -100, 100]);
        assert_eq!(frame.manipulator_grip, 1);
        assert_eq!(frame.manipulator_rotate, -1);
        assert_eq!(frame.camera_pan, 1);
        assert_eq!(frame.camera_tilt, -1);
    }

    #[test]
    fn override_invert_mask_flips_sign() {
        let ovr = ThrusterOverride {
            enabled: true,
            powers: [10, -10, 0, 0, 0, 0, 0, 100],
            invert: ThrusterMask::new(0b1000_0001),
        };
        assert_eq!(ovr.effective_powers(), [-10, -10, 0, 0, 0, 0, 0, -100]);
    }

    #[test]
    fn override_clamps_before_inverting() {
        let ovr = ThrusterOverride {
            enabled: true,
            powers: [-128, 0, 0, 0, 0, 0, 0, 0],
            invert: ThrusterMask::new(1),
        };
        assert_eq!(ovr.effective_powers()[0], 100);
    }

    #[test]
    fn rejected_telemetry_keeps_only_header() {
        let frame = TelemetryFrame::rejected(0x42);
        assert_eq!(frame.header, 0x42);
        assert!(!frame.is_valid());
        assert_eq!(frame.depth, 0.0);
        assert!(TelemetryFrame::default().is_valid());
    }

    #[test]
    fn aux_target_axis_accessors() {
        let mut aux = AuxTarget::default();
        aux.set_target(AuxAxis::Roll, 12.5);
        aux.flags = aux.flags.with_axis(AuxAxis::Roll, true);
        assert_eq!(aux.target(AuxAxis::Roll), 12.5);
        assert!(aux.is_enabled(AuxAxis::Roll));
        assert!(!aux.is_enabled(AuxAxis::Depth));
    }
}
