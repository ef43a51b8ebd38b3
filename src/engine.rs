//! The engine controller: the arm/launch handshake, injector valve control,
//! and the burn timer. Grounded on the teacher's `safety::handle_arm_status`
//! two-step arming handshake, generalized from "stick gesture" to "ground
//! command count" per spec.md §9's resolution of the arm/launch Open
//! Question, and on the original firmware's chamber-pressure abort check in
//! `MonitorForEmergencyShutoff`.

use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::control_context::ControlContext;
use crate::phase::FlightPhase;

/// Engine-controller working state: the instant `BURN` was entered, needed
/// to evaluate the fixed burn timeout independent of wall-clock tick count.
#[derive(Default)]
pub struct EngineState {
    burn_started_at: Option<Instant>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run one control tick of the engine controller.
pub fn tick(ctx: &ControlContext, state: &mut EngineState, now: Instant) {
    let phase = ctx.phase.current();

    if phase.is_abort() {
        handle_manual_injector_commands(ctx);
        return;
    }

    match phase {
        FlightPhase::Prelaunch => {
            if ctx.flags.arm_cmd_received.load(Ordering::SeqCst) {
                ctx.phase.transition(FlightPhase::Arm);
            }
        }
        FlightPhase::Arm => {
            if ctx.flags.launch_cmd_count.load(Ordering::SeqCst) >= ctx.config.launch_cmd_threshold {
                if ctx.actuators.set_injection_valve(true).is_ok() {
                    state.burn_started_at = Some(now);
                    ctx.phase.transition(FlightPhase::Burn);
                }
            }
        }
        FlightPhase::Burn => {
            if let Ok(reading) = ctx.sensor_io.read_chamber_pressure() {
                ctx.sensors.chamber_pressure.publish(reading);
                if reading.pressure >= ctx.config.chamber_pressure_ceiling {
                    let _ = ctx.actuators.set_injection_valve(false);
                    ctx.phase.transition(FlightPhase::AbortUnspecified);
                    return;
                }
            } else {
                ctx.sensors.chamber_pressure.invalidate();
            }

            let elapsed = state
                .burn_started_at
                .map(|t| now.duration_since(t))
                .unwrap_or_default();
            if elapsed >= ctx.config.burn_duration {
                let _ = ctx.actuators.set_injection_valve(false);
                ctx.phase.transition(FlightPhase::Coast);
            }
        }
        _ => {}
    }
}

/// Once an abort has latched, the ground crew may open or close the
/// injection valve manually (e.g. to vent or re-seal it) via the dedicated
/// command bytes; outside an abort phase these bytes are ignored entirely,
/// so the valve only opens on the explicit ground command, never as a side
/// effect of arming. Each flag is cleared once actioned so the command
/// fires once per byte.
fn handle_manual_injector_commands(ctx: &ControlContext) {
    if ctx.flags.open_injector_cmd_received.swap(false, Ordering::SeqCst) {
        let _ = ctx.actuators.set_injection_valve(true);
    }
    if ctx.flags.close_injector_cmd_received.swap(false, Ordering::SeqCst) {
        let _ = ctx.actuators.set_injection_valve(false);
    }
}
