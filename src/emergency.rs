//! The emergency-shutoff monitor: the highest-priority control task, run
//! every tick ahead of everything else so an abort condition is latched
//! before any other task acts on stale phase data. Grounded on the original
//! firmware's `MonitorForEmergencyShutoff` (see spec.md §4.5) and the
//! teacher's `safety::link_lost_timeout` watchdog for the heartbeat half.
//!
//! Checked in a fixed order every tick: heartbeat timeout, ground abort
//! command, oxidizer tank over-pressure, then ground reset. Order matters
//! only in that reset is checked last, so a reset issued in the same tick as
//! a fresh abort condition does not erase it.

use std::sync::atomic::Ordering;

use crate::control_context::ControlContext;
use crate::phase::FlightPhase;

/// Run one tick of the emergency monitor.
pub fn tick(ctx: &ControlContext) {
    if ctx.phase.current().is_abort() {
        // Still check for a ground reset even while aborted; everything
        // else is moot once an abort has latched.
        check_reset(ctx);
        return;
    }

    if ctx.heartbeat.tick() == 0 {
        ctx.phase.transition(FlightPhase::AbortCommunicationError);
        return;
    }

    if ctx.flags.abort_cmd_received.load(Ordering::SeqCst) {
        ctx.phase.transition(FlightPhase::AbortCommandReceived);
        return;
    }

    if let Ok(reading) = ctx.sensor_io.read_oxidizer_tank_pressure() {
        ctx.sensors.oxidizer_tank_pressure.publish(reading);
        if reading.pressure >= ctx.config.tank_pressure_ceiling {
            ctx.phase.transition(FlightPhase::AbortOxidizerPressure);
            return;
        }
    } else {
        ctx.sensors.oxidizer_tank_pressure.invalidate();
    }

    check_reset(ctx);
}

fn check_reset(ctx: &ControlContext) {
    if ctx.flags.reset_cmd_received.load(Ordering::SeqCst) {
        ctx.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::sim::{SimActuators, SimGroundLink, SimSensors};
    use std::sync::Arc;

    fn test_ctx() -> (Arc<ControlContext>, Arc<SimSensors>) {
        let sensors = Arc::new(SimSensors::new());
        let ctx = ControlContext::new(
            SystemConfig::default(),
            sensors.clone(),
            Arc::new(SimActuators::new()),
            Arc::new(SimGroundLink::new()),
        );
        (ctx, sensors)
    }

    #[test]
    fn heartbeat_exhaustion_aborts_on_communication_error() {
        let (ctx, _sensors) = test_ctx();
        for _ in 0..ctx.heartbeat.remaining() {
            tick(&ctx);
        }
        assert_eq!(ctx.phase.current(), FlightPhase::AbortCommunicationError);
    }

    #[test]
    fn abort_command_is_honored_before_timeout() {
        let (ctx, _sensors) = test_ctx();
        ctx.flags.abort_cmd_received.store(true, Ordering::SeqCst);
        tick(&ctx);
        assert_eq!(ctx.phase.current(), FlightPhase::AbortCommandReceived);
    }

    #[test]
    fn over_pressure_reading_triggers_oxidizer_abort() {
        let (ctx, sensors) = test_ctx();
        sensors.set_oxidizer_tank_pressure(ctx.config.tank_pressure_ceiling + 1.0);
        tick(&ctx);
        assert_eq!(ctx.phase.current(), FlightPhase::AbortOxidizerPressure);
    }

    #[test]
    fn reset_command_returns_to_prelaunch_from_abort() {
        let (ctx, _sensors) = test_ctx();
        ctx.flags.abort_cmd_received.store(true, Ordering::SeqCst);
        tick(&ctx);
        assert!(ctx.phase.is_abort());

        ctx.flags.reset_cmd_received.store(true, Ordering::SeqCst);
        tick(&ctx);
        assert_eq!(ctx.phase.current(), FlightPhase::Prelaunch);
    }

    #[test]
    fn nominal_tick_does_not_abort() {
        let (ctx, sensors) = test_ctx();
        sensors.set_oxidizer_tank_pressure(1_000_000.0);
        tick(&ctx);
        assert!(!ctx.phase.is_abort());
    }
}
