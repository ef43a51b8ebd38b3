//! The abort-phase vent controller: cycles the oxidizer tank vent valve
//! open/closed to bleed pressure once any abort phase has latched. Grounded
//! on the original firmware's `ValveControl` vent-cycle state machine
//! (spec.md §4.6) and on the teacher's `safety` module's cycle-and-hold
//! pattern for the killswitch relay.
//!
//! Runs only while `PhaseCell::is_abort()` is true; a nominal flight never
//! touches the vent valve through this path (the engine task handles
//! injector venting during normal operation).

use std::time::Instant;

use crate::control_context::ControlContext;

/// The vent valve's open/closed cycle, with the instant of the last
/// transition so [`tick`] can enforce the configured minimum dwell times.
enum VentState {
    Closed { since: Instant },
    Open { since: Instant },
}

pub struct AbortVentController {
    state: VentState,
}

impl AbortVentController {
    pub fn new(now: Instant) -> Self {
        Self {
            state: VentState::Closed { since: now },
        }
    }
}

/// Run one tick of the vent-cycle controller. A no-op unless the current
/// phase is an abort phase.
pub fn tick(ctx: &ControlContext, controller: &mut AbortVentController, now: Instant) {
    if !ctx.phase.is_abort() {
        return;
    }

    match controller.state {
        VentState::Closed { since } => {
            if now.duration_since(since) >= ctx.config.vent_min_closed {
                if ctx.actuators.set_vent_valve(true).is_ok() {
                    controller.state = VentState::Open { since: now };
                }
            }
        }
        VentState::Open { since } => {
            let pressure = ctx
                .sensor_io
                .read_oxidizer_tank_pressure()
                .map(|r| r.pressure)
                .ok();

            let below_safe = pressure.map(|p| p < ctx.config.tank_pressure_safe).unwrap_or(false);
            let timed_out = now.duration_since(since) >= ctx.config.vent_max_open;

            if below_safe || timed_out {
                if ctx.actuators.set_vent_valve(false).is_ok() {
                    controller.state = VentState::Closed { since: now };
                }
            }
        }
    }
}
