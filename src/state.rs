//! Shared control state mutated by the operator UI and read by the link tasks
//!
//! Each logical field has its own guard so that a setter from the UI thread
//! never waits on the mixing path and vice versa:
//!
//! | Field              | Guard        |
//! |--------------------|--------------|
//! | override enable    | `AtomicBool` |
//! | override invert    | `AtomicU8`   |
//! | override powers    | `Mutex`      |
//! | aux bundle         | `Mutex`      |
//!
//! Critical sections copy in or copy out and nothing else. No guard is held
//! while another is acquired, and none is held across I/O or an `.await`.
//! The aux bundle is read in one critical section so the four setpoints and
//! their flags are never torn.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::types::{
    AuxAxis, AuxFlags, AuxTarget, THRUSTER_COUNT, ThrusterMask, ThrusterOverride, clamp_power,
};

/// Recover the guard from a poisoned mutex.
///
/// Every field here is plain data written in a single assignment, so a panic
/// in another holder cannot leave it half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Concurrently accessed control state.
#[derive(Debug, Default)]
pub struct SharedControlState {
    override_enabled: AtomicBool,
    override_invert: AtomicU8,
    override_powers: Mutex<[i8; THRUSTER_COUNT]>,
    aux: Mutex<AuxTarget>,
}

impl SharedControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable thruster overrides.
    pub fn set_override_enabled(&self, enabled: bool) {
        debug!(enabled, "Thruster override");
        self.override_enabled.store(enabled, Ordering::Release);
    }

    /// Replace override powers starting at thruster 0.
    ///
    /// A shorter slice leaves the remaining thrusters untouched; extra values
    /// past the last thruster are ignored. Values are clamped to `[-100, 100]`.
    pub fn set_override_powers(&self, powers: &[i8]) {
        let mut clamped = [0i8; THRUSTER_COUNT];
        let n = powers.len().min(THRUSTER_COUNT);
        for (dst, src) in clamped.iter_mut().zip(powers) {
            *dst = clamp_power(*src);
        }

        let mut guard = lock(&self.override_powers);
        guard[..n].copy_from_slice(&clamped[..n]);
    }

    /// Set a single override power.
    pub fn set_override_power(&self, thruster: usize, power: i8) {
        if thruster >= THRUSTER_COUNT {
            return;
        }
        lock(&self.override_powers)[thruster] = clamp_power(power);
    }

    /// Replace the override invert mask (bit `i` inverts thruster `i`).
    pub fn set_override_invert(&self, mask: ThrusterMask) {
        self.override_invert.store(mask.value(), Ordering::Release);
    }

    /// Snapshot of the override state for one mix.
    ///
    /// The enable flag is read exactly once. Powers and mask are copied out of
    /// their own guards one after the other.
    pub fn override_snapshot(&self) -> ThrusterOverride {
        let enabled = self.override_enabled.load(Ordering::Acquire);
        if !enabled {
            return ThrusterOverride::default();
        }
        let powers = *lock(&self.override_powers);
        let invert = ThrusterMask::new(self.override_invert.load(Ordering::Acquire));
        ThrusterOverride { enabled, powers, invert }
    }

    /// Set the setpoint for one stabilization axis.
    pub fn set_aux_target(&self, axis: AuxAxis, value: f64) {
        debug!(?axis, value, "Aux target");
        lock(&self.aux).set_target(axis, value);
    }

    /// Enable or disable stabilization on one axis.
    pub fn set_aux_enabled(&self, axis: AuxAxis, enabled: bool) {
        debug!(?axis, enabled, "Aux enable");
        let mut aux = lock(&self.aux);
        aux.flags = aux.flags.with_axis(axis, enabled);
    }

    /// Replace all aux enable flags at once.
    pub fn set_aux_flags(&self, flags: AuxFlags) {
        lock(&self.aux).flags = flags;
    }

    pub fn set_depth(&self, value: f64) {
        self.set_aux_target(AuxAxis::Depth, value);
    }

    pub fn set_yaw(&self, value: f64) {
        self.set_aux_target(AuxAxis::Yaw, value);
    }

    pub fn set_roll(&self, value: f64) {
        self.set_aux_target(AuxAxis::Roll, value);
    }

    pub fn set_pitch(&self, value: f64) {
        self.set_aux_target(AuxAxis::Pitch, value);
    }

    /// Consistent copy of the aux bundle for one AuxControl frame.
    pub fn aux_snapshot(&self) -> AuxTarget {
        *lock(&self.aux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn defaults_are_disabled_and_zero() {
        let state = SharedControlState::new();
        assert_eq!(state.override_snapshot(), ThrusterOverride::default());
        assert_eq!(state.aux_snapshot(), AuxTarget::default());
    }

    #[test]
    fn override_snapshot_reflects_setters() {
        let state = SharedControlState::new();
        state.set_override_powers(&[10, -10]);
        state.set_override_invert(ThrusterMask::new(0b01));
        state.set_override_enabled(true);

        let snapshot = state.override_snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.powers, [10, -10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(snapshot.effective_powers()[..2], [-10, -10]);
    }

    #[test]
    fn partial_power_update_keeps_tail() {
        let state = SharedControlState::new();
        state.set_override_enabled(true);
        state.set_override_powers(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        state.set_override_powers(&[-1, -2]);
        state.set_override_power(7, 120);
        state.set_override_power(12, 50);
        assert_eq!(state.override_snapshot().powers, [-1, -2, 3, 4, 5, 6, 7, 100]);
    }

    #[test]
    fn disabled_snapshot_hides_powers() {
        let state = SharedControlState::new();
        state.set_override_powers(&[50; 8]);
        assert_eq!(state.override_snapshot(), ThrusterOverride::default());
    }

    #[test]
    fn aux_setters_are_independent() {
        let state = SharedControlState::new();
        state.set_depth(2.5);
        state.set_yaw(90.0);
        state.set_aux_enabled(AuxAxis::Depth, true);
        state.set_aux_enabled(AuxAxis::Roll, true);
        state.set_aux_enabled(AuxAxis::Depth, false);

        let aux = state.aux_snapshot();
        assert_eq!(aux.depth, 2.5);
        assert_eq!(aux.yaw, 90.0);
        assert_eq!(aux.flags, AuxFlags::ROLL);

        state.set_aux_flags(AuxFlags::all());
        assert_eq!(state.aux_snapshot().flags, AuxFlags::all());
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let state = Arc::new(SharedControlState::new());
        let poisoner = Arc::clone(&state);
        let _ = thread::spawn(move || {
            let _guard = poisoner.aux.lock().unwrap();
            panic!("poison the aux lock");
        })
        .join();

        state.set_pitch(-4.0);
        assert_eq!(state.aux_snapshot().pitch, -4.0);
    }

    #[test]
    fn aux_snapshot_sees_only_written_values() {
        let state = Arc::new(SharedControlState::new());

        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 0..5_000 {
                    let on = i % 2 == 0;
                    state.set_aux_flags(if on { AuxFlags::all() } else { AuxFlags::empty() });
                    state.set_depth(if on { 12.5 } else { -3.0 });
                    state.set_aux_target(AuxAxis::Roll, if on { 45.0 } else { -45.0 });
                }
            })
        };

        for _ in 0..5_000 {
            let aux = state.aux_snapshot();
            assert!(
                aux.flags == AuxFlags::all() || aux.flags == AuxFlags::empty(),
                "mixed flags {:?}",
                aux.flags
            );
            assert!([0.0, 12.5, -3.0].contains(&aux.depth), "depth {}", aux.depth);
            assert!([0.0, 45.0, -45.0].contains(&aux.roll), "roll {}", aux.roll);
            assert_eq!(aux.yaw, 0.0);
        }
        writer.join().expect("writer panicked");
    }

    #[test]
    fn concurrent_disjoint_setters_never_tear() {
        let state = Arc::new(SharedControlState::new());
        state.set_override_enabled(true);

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..2_000i32 {
                        if t % 2 == 0 {
                            let v = if i % 2 == 0 { 40 } else { -40 };
                            state.set_override_powers(&[v; THRUSTER_COUNT]);
                        } else {
                            let v = f64::from(i % 2);
                            state.set_depth(v);
                            state.set_yaw(v);
                        }
                    }
                })
            })
            .collect();

        let reader = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    let powers = state.override_snapshot().powers;
                    assert!(powers.iter().all(|p| *p == powers[0]), "torn powers {:?}", powers);
                    let aux = state.aux_snapshot();
                    assert!(aux.depth == 0.0 || aux.depth == 1.0);
                }
            })
        };

        for writer in writers {
            writer.join().expect("writer panicked");
        }
        reader.join().expect("reader saw a torn value");
    }
}
