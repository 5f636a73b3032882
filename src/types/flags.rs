//! Bit-packed flag types carried on the wire

use bitflags::bitflags;

bitflags! {
    /// Stabilization enable flags sent in every AuxControl frame.
    ///
    /// Each regulator on the vehicle (depth hold, heading hold, roll and pitch
    /// stabilization) is switched independently.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AuxFlags: u8 {
        const DEPTH = 1 << 0;
        const YAW = 1 << 1;
        const ROLL = 1 << 2;
        const PITCH = 1 << 3;
    }
}

impl AuxFlags {
    /// Flag for a single stabilization axis.
    pub fn for_axis(axis: AuxAxis) -> Self {
        match axis {
            AuxAxis::Depth => AuxFlags::DEPTH,
            AuxAxis::Yaw => AuxFlags::YAW,
            AuxAxis::Roll => AuxFlags::ROLL,
            AuxAxis::Pitch => AuxFlags::PITCH,
        }
    }

    /// Return a copy with the axis enabled or disabled.
    pub fn with_axis(self, axis: AuxAxis, enabled: bool) -> Self {
        let mut flags = self;
        flags.set(Self::for_axis(axis), enabled);
        flags
    }
}

/// Stabilization axes controlled through the aux channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxAxis {
    Depth,
    Yaw,
    Roll,
    Pitch,
}

/// Per-thruster bit mask, bit `i` refers to thruster `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThrusterMask(pub u8);

impl ThrusterMask {
    /// Create a new mask from its raw byte.
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Check if the bit for `thruster` is set.
    ///
    /// Indices past the mask width are never set.
    pub fn is_set(&self, thruster: usize) -> bool {
        thruster < 8 && (self.0 & (1 << thruster)) != 0
    }

    /// Return a copy with the bit for `thruster` set or cleared.
    pub fn with(self, thruster: usize, set: bool) -> Self {
        if thruster >= 8 {
            return self;
        }
        let bit = 1u8 << thruster;
        if set { Self(self.0 | bit) } else { Self(self.0 & !bit) }
    }

    /// Sign applied to thruster `i`: -1 when inverted, +1 otherwise.
    pub fn sign(&self, thruster: usize) -> i8 {
        if self.is_set(thruster) { -1 } else { 1 }
    }

    /// Get the raw byte.
    pub fn value(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aux_flags_bit_layout() {
        assert_eq!(AuxFlags::DEPTH.bits(), 0b0001);
        assert_eq!(AuxFlags::YAW.bits(), 0b0010);
        assert_eq!(AuxFlags::ROLL.bits(), 0b0100);
        assert_eq!(AuxFlags::PITCH.bits(), 0b1000);
    }

    #[test]
    fn aux_flags_toggle_independently() {
        let flags = AuxFlags::empty()
            .with_axis(AuxAxis::Depth, true)
            .with_axis(AuxAxis::Pitch, true)
            .with_axis(AuxAxis::Depth, false);
        assert_eq!(flags, AuxFlags::PITCH);
    }

    #[test]
    fn thruster_mask_bits() {
        let mask = ThrusterMask::new(0b1000_0001);
        assert!(mask.is_set(0));
        assert!(mask.is_set(7));
        assert!(!mask.is_set(3));
        assert!(!mask.is_set(8));
        assert_eq!(mask.sign(0), -1);
        assert_eq!(mask.sign(1), 1);
    }

    #[test]
    fn thruster_mask_with() {
        let mask = ThrusterMask::default().with(2, true).with(5, true).with(2, false);
        assert_eq!(mask.value(), 0b0010_0000);
        assert_eq!(mask.with(9, true), mask);
    }
}
