//! Joystick to thruster mixing
//!
//! Converts one [`JoystickSample`] into a complete [`ControlFrame`]: six scaled
//! axes are combined into eight thruster powers through a fixed mix matrix,
//! unless thruster overrides are enabled, in which case the operator-set powers
//! are sent as-is (with the invert mask applied).
//!
//! Thruster layout:
//!
//! ```text
//!   0: front-left horizontal     4: front-left vertical
//!   1: front-right horizontal    5: front-right vertical
//!   2: rear-left horizontal      6: rear-left vertical
//!   3: rear-right horizontal     7: rear-right vertical
//! ```

use crate::types::{
    AXIS_COUNT, Axis, ControlFrame, JoystickSample, THRUSTER_COUNT, THRUSTER_LIMIT,
    ThrusterOverride, clamp_unit,
};

/// Contribution of each axis to each thruster.
///
/// Rows: thrusters. Columns: `[lateral, longitudinal, vertical, yaw, pitch, roll]`.
pub const MIX_MATRIX: [[f32; AXIS_COUNT]; THRUSTER_COUNT] = [
    // Horizontal thrusters
    [1.0, -1.0, 0.0, -1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0, 1.0, 0.0, 0.0],
    [1.0, 0.5, 0.0, -1.0, 0.0, 0.0],
    [1.0, -0.5, 0.0, 1.0, 0.0, 0.0],
    // Vertical thrusters
    [0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
    [0.0, 0.0, 1.0, 0.0, 1.0, -1.0],
    [0.0, 0.0, 1.0, 0.0, -1.0, 1.0],
    [0.0, 0.0, 1.0, 0.0, -1.0, -1.0],
];

/// Rising-edge detector for the camera-select button.
///
/// Remembers the previous button level and the camera currently selected.
/// Owned by whoever drives the mixer; it is not shared between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraSelectEdgeState {
    previous_level: bool,
    selected: bool,
}

impl CameraSelectEdgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current button level. Toggles the selection on a
    /// released-to-pressed transition and returns the selection.
    pub fn update(&mut self, level: bool) -> bool {
        if level && !self.previous_level {
            self.selected = !self.selected;
        }
        self.previous_level = level;
        self.selected
    }

    /// Currently selected camera (`false` = primary, `true` = secondary).
    pub fn selected(&self) -> bool {
        self.selected
    }
}

/// Mix the six scaled axes into thruster powers clamped to `[-100, 100]`.
pub fn mix_axes(sample: &JoystickSample) -> [i8; THRUSTER_COUNT] {
    let axes: [f32; AXIS_COUNT] = Axis::ALL.map(|axis| f32::from(sample.scaled(axis)));
    let limit = f32::from(THRUSTER_LIMIT);

    MIX_MATRIX.map(|row| {
        let sum: f32 = row.iter().zip(axes.iter()).map(|(coeff, value)| coeff * value).sum();
        sum.clamp(-limit, limit).trunc() as i8
    })
}

/// Build the control frame for one joystick sample.
///
/// `overrides` is a single snapshot: the enable flag read there decides the
/// whole computation. The only state carried between calls is `edge`.
pub fn mix(
    sample: &JoystickSample,
    overrides: &ThrusterOverride,
    edge: &mut CameraSelectEdgeState,
) -> ControlFrame {
    let buttons = &sample.buttons;
    let manipulator_grip = i8::from(buttons.manipulator_open) - i8::from(buttons.manipulator_close);
    let manipulator_rotate = i8::from(buttons.manipulator_ccw) - i8::from(buttons.manipulator_cw);
    let camera_select = edge.update(buttons.camera_select);

    let thrusters =
        if overrides.enabled { overrides.effective_powers() } else { mix_axes(sample) };

    ControlFrame {
        thrusters,
        manipulator_grip,
        manipulator_rotate,
        camera_pan: clamp_unit(sample.hats[1]),
        camera_tilt: clamp_unit(sample.hats[0]),
        camera_select,
        ..ControlFrame::default()
    }
}
