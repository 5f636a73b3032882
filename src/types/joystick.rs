//! Normalized joystick input consumed by the mixer

use serde::{Deserialize, Serialize};

/// Number of analog axes in a sample.
pub const AXIS_COUNT: usize = 6;

/// Analog axes in sample order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left-right translation
    Lateral = 0,
    /// Forward-backward translation
    Longitudinal = 1,
    /// Up-down translation
    Vertical = 2,
    /// Rotation around the vertical axis
    Yaw = 3,
    /// Nose up-down
    Pitch = 4,
    Roll = 5,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] =
        [Axis::Lateral, Axis::Longitudinal, Axis::Vertical, Axis::Yaw, Axis::Pitch, Axis::Roll];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Configured direction of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisDirection {
    #[default]
    Normal,
    Inverted,
}

impl AxisDirection {
    pub fn sign(self) -> f32 {
        match self {
            AxisDirection::Normal => 1.0,
            AxisDirection::Inverted => -1.0,
        }
    }
}

/// Button levels relevant to the control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoystickButtons {
    pub manipulator_open: bool,
    pub manipulator_close: bool,
    pub manipulator_ccw: bool,
    pub manipulator_cw: bool,
    /// Level of the camera-select button; the mixer edge-detects it.
    pub camera_select: bool,
}

/// One poll of the joystick, already normalized by the input collaborator.
///
/// Axis values are nominally in `[-127, 127]`. The effective value of an axis
/// is `axis * runtime_scale * base_scale * direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickSample {
    pub axes: [i16; AXIS_COUNT],
    /// Per-axis factor from the joystick setup (normally <= 1.0)
    pub base_scale: [f32; AXIS_COUNT],
    /// Per-axis factor adjusted while driving (thrust factor)
    pub runtime_scale: [f32; AXIS_COUNT],
    pub directions: [AxisDirection; AXIS_COUNT],
    pub buttons: JoystickButtons,
    /// Hat switch axes, each -1, 0 or 1
    pub hats: [i8; 2],
}

impl Default for JoystickSample {
    fn default() -> Self {
        Self {
            axes: [0; AXIS_COUNT],
            base_scale: [1.0; AXIS_COUNT],
            runtime_scale: [1.0; AXIS_COUNT],
            directions: [AxisDirection::Normal; AXIS_COUNT],
            buttons: JoystickButtons::default(),
            hats: [0; 2],
        }
    }
}

impl JoystickSample {
    /// Sample with every axis centered, unit scales and normal directions.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Return a copy with one axis deflected.
    pub fn with_axis(mut self, axis: Axis, value: i16) -> Self {
        self.axes[axis.index()] = value;
        self
    }

    /// Return a copy with the same runtime scale applied to every axis.
    pub fn with_runtime_scale(mut self, factor: f32) -> Self {
        self.runtime_scale = [factor; AXIS_COUNT];
        self
    }

    /// Effective axis value, truncated toward zero and saturated to `i8`.
    pub fn scaled(&self, axis: Axis) -> i8 {
        let i = axis.index();
        let value = f32::from(self.axes[i])
            * self.runtime_scale[i]
            * self.base_scale[i]
            * self.directions[i].sign();
        // `as` saturates and maps NaN to zero
        value.trunc() as i8
    }
}
