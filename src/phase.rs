//! The flight-phase state machine: a process-wide cell, mutex-protected, with
//! a guarded transition operation and monotonicity rules.
//!
//! Normal phases advance monotonically; any phase may transition to any
//! abort phase; abort phases are terminal except that a ground `RESET`
//! command returns the system to `PRELAUNCH` -- and a `RESET` is honored
//! from any phase, not only while aborted, since the emergency monitor
//! applies it unconditionally. No ordering check is enforced
//! in release builds -- correctness relies on each caller asserting the
//! precondition, same as the teacher's `safety::handle_arm_status` relies on
//! its caller only invoking it from the right place in the main loop. Debug
//! builds assert the precondition so a violation is caught in testing.

use std::sync::{Condvar, Mutex};

/// All flight phases, normal and abort. `#[repr(u8)]` so the current phase
/// can ride in the telemetry frame as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum FlightPhase {
    Prelaunch = 0,
    Arm = 1,
    Burn = 2,
    Coast = 3,
    DrogueDescent = 4,
    MainDescent = 5,
    AbortCommandReceived = 10,
    AbortOxidizerPressure = 11,
    AbortUnspecified = 12,
    AbortCommunicationError = 13,
}

impl FlightPhase {
    /// True iff this phase is any abort variant.
    pub fn is_abort(self) -> bool {
        matches!(
            self,
            FlightPhase::AbortCommandReceived
                | FlightPhase::AbortOxidizerPressure
                | FlightPhase::AbortUnspecified
                | FlightPhase::AbortCommunicationError
        )
    }

    /// Ordinal among the normal (non-abort) phases, for monotonicity checks.
    /// Returns `None` for abort phases.
    fn normal_ordinal(self) -> Option<u8> {
        match self {
            FlightPhase::Prelaunch => Some(0),
            FlightPhase::Arm => Some(1),
            FlightPhase::Burn => Some(2),
            FlightPhase::Coast => Some(3),
            FlightPhase::DrogueDescent => Some(4),
            FlightPhase::MainDescent => Some(5),
            _ => None,
        }
    }
}

/// Process-wide current-phase cell. Every controller reads this at most
/// once per control tick; the write cost is negligible next to actuator
/// latency, so a mutex-protected scalar (not a broadcast channel) suffices.
pub struct PhaseCell {
    phase: Mutex<FlightPhase>,
    watchers: Condvar,
}

impl PhaseCell {
    pub fn new(initial: FlightPhase) -> Self {
        Self {
            phase: Mutex::new(initial),
            watchers: Condvar::new(),
        }
    }

    /// Acquire the phase mutex and return the current value.
    pub fn current(&self) -> FlightPhase {
        *self.phase.lock().expect("phase mutex poisoned")
    }

    /// True iff the current phase is any abort variant.
    pub fn is_abort(&self) -> bool {
        self.current().is_abort()
    }

    /// Overwrite the stored phase and notify any waiter. Debug builds assert
    /// the transition isn't a normal-phase regression and isn't an escape
    /// from an abort phase other than via `PRELAUNCH` (reset).
    pub fn transition(&self, to: FlightPhase) {
        let mut guard = self.phase.lock().expect("phase mutex poisoned");
        debug_assert!(
            Self::is_legal(*guard, to),
            "illegal flight phase transition: {:?} -> {:?}",
            *guard,
            to
        );
        *guard = to;
        self.watchers.notify_all();
    }

    /// Block until the phase changes from `from`, waking periodically so a
    /// caller can also check for shutdown. Used by tests and demo tooling;
    /// control-loop tasks poll `current()` on their own tick instead.
    pub fn wait_while(&self, from: FlightPhase, timeout: std::time::Duration) -> FlightPhase {
        let guard = self.phase.lock().expect("phase mutex poisoned");
        let (guard, _) = self
            .watchers
            .wait_timeout_while(guard, timeout, |p| *p == from)
            .expect("phase mutex poisoned");
        *guard
    }

    fn is_legal(from: FlightPhase, to: FlightPhase) -> bool {
        if from == to {
            return true;
        }
        // A reset to PRELAUNCH is legal from any phase: the emergency monitor
        // applies it unconditionally on a ground RESET, not only while
        // aborted.
        if to.is_abort() || to == FlightPhase::Prelaunch {
            return true;
        }
        match (from.normal_ordinal(), to.normal_ordinal()) {
            (Some(f), Some(t)) => t > f,
            _ => false,
        }
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new(FlightPhase::Prelaunch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_returns_initial_phase() {
        let cell = PhaseCell::new(FlightPhase::Prelaunch);
        assert_eq!(cell.current(), FlightPhase::Prelaunch);
    }

    #[test]
    fn normal_progression_is_monotonic() {
        let cell = PhaseCell::new(FlightPhase::Prelaunch);
        cell.transition(FlightPhase::Arm);
        cell.transition(FlightPhase::Burn);
        cell.transition(FlightPhase::Coast);
        assert_eq!(cell.current(), FlightPhase::Coast);
    }

    #[test]
    fn any_phase_can_abort() {
        let cell = PhaseCell::new(FlightPhase::Burn);
        cell.transition(FlightPhase::AbortOxidizerPressure);
        assert!(cell.is_abort());
    }

    #[test]
    fn reset_returns_to_prelaunch() {
        let cell = PhaseCell::new(FlightPhase::AbortCommandReceived);
        cell.transition(FlightPhase::Prelaunch);
        assert_eq!(cell.current(), FlightPhase::Prelaunch);
    }

    #[test]
    fn reset_is_legal_from_a_normal_phase_too() {
        let cell = PhaseCell::new(FlightPhase::Burn);
        cell.transition(FlightPhase::Prelaunch);
        assert_eq!(cell.current(), FlightPhase::Prelaunch);
    }

    #[test]
    fn illegal_regression_is_detected_in_debug() {
        assert!(!PhaseCell::is_legal(FlightPhase::Coast, FlightPhase::Burn));
        assert!(!PhaseCell::is_legal(
            FlightPhase::AbortOxidizerPressure,
            FlightPhase::Coast
        ));
        assert!(PhaseCell::is_legal(
            FlightPhase::AbortOxidizerPressure,
            FlightPhase::Prelaunch
        ));
    }

    #[test]
    fn wire_repr_round_trips() {
        use num_enum::TryFromPrimitive;
        let byte: u8 = FlightPhase::DrogueDescent.into();
        assert_eq!(byte, 4);
        assert_eq!(
            FlightPhase::try_from_primitive(byte).unwrap(),
            FlightPhase::DrogueDescent
        );
    }
}
