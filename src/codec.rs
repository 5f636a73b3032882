//! Binary wire format for the vehicle link
//!
//! Three fixed-size records travel over UDP, one record per datagram:
//!
//! 1. **Control** (17 bytes) - operator to vehicle, one per joystick sample
//! 2. **AuxControl** (18 bytes) - operator to vehicle, one per heartbeat tick
//! 3. **Telemetry** (34 bytes) - vehicle to operator
//!
//! Every record starts with a header byte identifying its type. Multi-byte
//! fields are big-endian, floats are IEEE-754 single precision, and there is
//! no length prefix or padding. The layout is fixed by the vehicle firmware.
//!
//! ## Control layout
//!
//! ```text
//! offset  size  field
//!      0     1  header (0xAC)
//!      1     1  protocol version
//!      2    10  thruster power, i8 each (slots 8 and 9 reserved, always 0)
//!     12     1  manipulator grip
//!     13     1  manipulator rotate
//!     14     1  camera pan delta
//!     15     1  camera tilt delta
//!     16     1  camera select (0 or 1)
//! ```
//!
//! ## AuxControl layout
//!
//! ```text
//!      0     1  header (0xAD)
//!      1     1  enable flags (bit0 depth, bit1 yaw, bit2 roll, bit3 pitch)
//!      2     4  depth target
//!      6     4  yaw target
//!     10     4  roll target
//!     14     4  pitch target
//! ```
//!
//! ## Telemetry layout
//!
//! ```text
//!      0     1  header (0xAE)
//!      1     1  version
//!      2    32  depth, pitch, yaw, roll, current, voltage, camera index, temperature
//! ```

use tracing::trace;

use crate::types::{
    AUX_HEADER, AuxFlags, AuxTarget, CONTROL_HEADER, ControlFrame, TELEMETRY_HEADER,
    THRUSTER_COUNT, THRUSTER_SLOTS, TelemetryFrame,
};
use crate::{LinkError, Result};

/// Encoded size of a Control frame.
pub const CONTROL_FRAME_SIZE: usize = 2 + THRUSTER_SLOTS + 5;
/// Encoded size of an AuxControl frame.
pub const AUX_FRAME_SIZE: usize = 2 + 4 * 4;
/// Encoded size of a Telemetry frame.
pub const TELEMETRY_FRAME_SIZE: usize = 2 + 8 * 4;
/// Largest record on the link, used to size receive buffers.
pub const MAX_FRAME_SIZE: usize = TELEMETRY_FRAME_SIZE;

/// Sequential big-endian writer over a fixed buffer.
struct FrameWriter<const N: usize> {
    buf: [u8; N],
    pos: usize,
}

impl<const N: usize> FrameWriter<N> {
    fn new() -> Self {
        Self { buf: [0u8; N], pos: 0 }
    }

    fn put_u8(&mut self, value: u8) {
        self.buf[self.pos] = value;
        self.pos += 1;
    }

    fn put_i8(&mut self, value: i8) {
        self.put_u8(value as u8);
    }

    fn put_f32(&mut self, value: f32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&value.to_be_bytes());
        self.pos += 4;
    }

    fn finish(self) -> [u8; N] {
        debug_assert_eq!(self.pos, N, "frame layout does not fill its buffer");
        self.buf
    }
}

/// Sequential big-endian reader. Callers validate the length up front, so
/// reads past the end indicate a layout bug and yield a malformed-frame error.
struct FrameReader<'a> {
    kind: &'static str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(kind: &'static str, data: &'a [u8]) -> Self {
        Self { kind, data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| LinkError::malformed_frame(self.kind, self.pos + N, self.data.len()))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos += N;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.take::<4>()?))
    }
}

/// Check the header byte, then the exact record length.
fn expect_frame(kind: &'static str, data: &[u8], header: u8, size: usize) -> Result<()> {
    let Some(&found) = data.first() else {
        return Err(LinkError::malformed_frame(kind, size, 0));
    };
    if found != header {
        return Err(LinkError::HeaderMismatch { expected: header, found });
    }
    if data.len() != size {
        return Err(LinkError::malformed_frame(kind, size, data.len()));
    }
    Ok(())
}

/// Encode a Control frame. Fields are clamped to their ranges first.
pub fn encode_control(frame: &ControlFrame) -> [u8; CONTROL_FRAME_SIZE] {
    let frame = frame.clamped();
    let mut w = FrameWriter::<CONTROL_FRAME_SIZE>::new();
    w.put_u8(frame.header);
    w.put_i8(frame.version);
    for slot in 0..THRUSTER_SLOTS {
        w.put_i8(frame.thrusters.get(slot).copied().unwrap_or(0));
    }
    w.put_i8(frame.manipulator_grip);
    w.put_i8(frame.manipulator_rotate);
    w.put_i8(frame.camera_pan);
    w.put_i8(frame.camera_tilt);
    w.put_u8(u8::from(frame.camera_select));
    w.finish()
}

/// Encode an AuxControl frame. Targets are narrowed to single precision.
pub fn encode_aux(aux: &AuxTarget) -> [u8; AUX_FRAME_SIZE] {
    let mut w = FrameWriter::<AUX_FRAME_SIZE>::new();
    w.put_u8(aux.header);
    w.put_u8(aux.flags.bits());
    w.put_f32(aux.depth as f32);
    w.put_f32(aux.yaw as f32);
    w.put_f32(aux.roll as f32);
    w.put_f32(aux.pitch as f32);
    w.finish()
}

/// Encode a Telemetry frame, as the vehicle does.
pub fn encode_telemetry(frame: &TelemetryFrame) -> [u8; TELEMETRY_FRAME_SIZE] {
    let mut w = FrameWriter::<TELEMETRY_FRAME_SIZE>::new();
    w.put_u8(frame.header);
    w.put_i8(frame.version);
    for value in [
        frame.depth,
        frame.pitch,
        frame.yaw,
        frame.roll,
        frame.current,
        frame.voltage,
        frame.camera_index,
        frame.temperature,
    ] {
        w.put_f32(value);
    }
    w.finish()
}

/// Decode an inbound Telemetry datagram.
///
/// The header byte is checked before anything else. On
/// [`LinkError::HeaderMismatch`] no other field has been read.
pub fn decode_telemetry(data: &[u8]) -> Result<TelemetryFrame> {
    expect_frame("telemetry", data, TELEMETRY_HEADER, TELEMETRY_FRAME_SIZE)?;
    let mut r = FrameReader::new("telemetry", data);
    let frame = TelemetryFrame {
        header: r.u8()?,
        version: r.i8()?,
        depth: r.f32()?,
        pitch: r.f32()?,
        yaw: r.f32()?,
        roll: r.f32()?,
        current: r.f32()?,
        voltage: r.f32()?,
        camera_index: r.f32()?,
        temperature: r.f32()?,
    };
    trace!(depth = frame.depth, voltage = frame.voltage, "Decoded telemetry");
    Ok(frame)
}

/// Decode a Control frame, as the vehicle does. Reserved thruster slots are skipped.
pub fn decode_control(data: &[u8]) -> Result<ControlFrame> {
    expect_frame("control", data, CONTROL_HEADER, CONTROL_FRAME_SIZE)?;
    let mut r = FrameReader::new("control", data);
    let header = r.u8()?;
    let version = r.i8()?;
    let mut thrusters = [0i8; THRUSTER_COUNT];
    for slot in 0..THRUSTER_SLOTS {
        let power = r.i8()?;
        if let Some(t) = thrusters.get_mut(slot) {
            *t = power;
        }
    }
    Ok(ControlFrame {
        header,
        version,
        thrusters,
        manipulator_grip: r.i8()?,
        manipulator_rotate: r.i8()?,
        camera_pan: r.i8()?,
        camera_tilt: r.i8()?,
        camera_select: r.u8()? != 0,
    })
}

/// Decode an AuxControl frame, as the vehicle does. Unknown flag bits are dropped.
pub fn decode_aux(data: &[u8]) -> Result<AuxTarget> {
    expect_frame("aux", data, AUX_HEADER, AUX_FRAME_SIZE)?;
    let mut r = FrameReader::new("aux", data);
    Ok(AuxTarget {
        header: r.u8()?,
        flags: AuxFlags::from_bits_truncate(r.u8()?),
        depth: f64::from(r.f32()?),
        yaw: f64::from(r.f32()?),
        roll: f64::from(r.f32()?),
        pitch: f64::from(r.f32()?),
    })
}
