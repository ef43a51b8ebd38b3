//! End-to-end scenarios driving the control loops directly (no threads),
//! one tick at a time, against the simulator backends. Mirrors the
//! satellite-telemetry pack's `integration_tests.rs` style: build a
//! context, script the simulated environment, assert on phase and
//! actuator state after a bounded number of ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use avionics_core::capability::{Actuators, GroundLink};
use avionics_core::command;
use avionics_core::config::SystemConfig;
use avionics_core::control_context::ControlContext;
use avionics_core::phase::FlightPhase;
use avionics_core::sim::{SimActuators, SimGroundLink, SimSensors};
use avionics_core::{abort, emergency, engine, parachute};

struct Harness {
    ctx: Arc<ControlContext>,
    sensors: Arc<SimSensors>,
    actuators: Arc<SimActuators>,
    ground_link: Arc<SimGroundLink>,
    parachute_state: parachute::ParachuteState,
    engine_state: engine::EngineState,
    vent_controller: abort::AbortVentController,
    now: Instant,
    dt: Duration,
}

impl Harness {
    fn new() -> Self {
        let sensors = Arc::new(SimSensors::new());
        let actuators = Arc::new(SimActuators::new());
        let ground_link = Arc::new(SimGroundLink::new());
        let config = SystemConfig::default();
        let dt = config.control_tick;
        let ctx = ControlContext::new(
            config,
            sensors.clone(),
            actuators.clone(),
            ground_link.clone(),
        );
        let now = Instant::now();
        Self {
            parachute_state: parachute::ParachuteState::new(ctx.config.launch_site_altitude),
            engine_state: engine::EngineState::new(),
            vent_controller: abort::AbortVentController::new(now),
            ctx,
            sensors,
            actuators,
            ground_link,
            now,
            dt,
        }
    }

    /// Advance every control loop by one tick, in the same priority order
    /// `main` spawns them: emergency, abort, engine, parachute.
    fn tick(&mut self) {
        self.now += self.dt;
        emergency::tick(&self.ctx);
        abort::tick(&self.ctx, &mut self.vent_controller, self.now);
        engine::tick(&self.ctx, &mut self.engine_state, self.now);
        parachute::tick(&self.ctx, &mut self.parachute_state, self.now, self.dt);
    }

    fn drain_ground_commands(&self) {
        while let Some(byte) = self.ground_link.try_recv_command_byte() {
            command::dispatch_command_byte(byte, &self.ctx.flags);
        }
    }

    fn send_command(&self, byte: u8) {
        self.ground_link.push_command_byte(byte);
        self.drain_ground_commands();
    }
}

/// Scenario 1: a clean flight from the pad through main-chute descent,
/// with no ground intervention beyond the arm/launch handshake.
#[test]
fn nominal_flight_reaches_main_descent() {
    let mut h = Harness::new();

    h.send_command(command::CMD_ARM);
    h.tick();
    assert_eq!(h.ctx.phase.current(), FlightPhase::Arm);

    for _ in 0..h.ctx.config.launch_cmd_threshold {
        h.send_command(command::CMD_LAUNCH);
    }
    h.tick();
    assert_eq!(h.ctx.phase.current(), FlightPhase::Burn);
    assert!(h.actuators.injection_valve_is_open());

    // Run out the burn timer.
    let burn_ticks = (h.ctx.config.burn_duration.as_secs_f64() / h.dt.as_secs_f64()).ceil() as u32 + 1;
    for _ in 0..burn_ticks {
        h.tick();
    }
    assert_eq!(h.ctx.phase.current(), FlightPhase::Coast);

    // Coast with a strictly decreasing altitude profile until apogee
    // declares and drogue fires.
    for _ in 0..h.ctx.config.descents_to_apogee {
        h.parachute_state.kalman.altitude -= 10.0;
        h.tick();
    }
    assert_eq!(h.ctx.phase.current(), FlightPhase::DrogueDescent);
    assert!(h.actuators.drogue_match_is_fired());

    // Descend below the main-deploy AGL threshold.
    h.parachute_state.kalman.altitude =
        h.ctx.config.launch_site_altitude + h.ctx.config.main_deploy_altitude_agl - 1.0;
    h.tick();
    assert_eq!(h.ctx.phase.current(), FlightPhase::MainDescent);
    assert!(h.actuators.main_match_is_fired());
}

/// Scenario 2: apogee detection never trips on real sensor data (e.g. a
/// stuck barometer), but `DROGUE_DESCENT`'s own timeout still recovers a
/// main deployment rather than descending under drogue forever. Here we
/// exercise the drogue-to-main timeout directly since apogee is declared
/// purely from the estimator's velocity sign.
#[test]
fn drogue_to_main_timeout_fires_without_altitude_crossing() {
    let mut h = Harness::new();
    h.ctx.phase.transition(FlightPhase::Arm);
    h.ctx.phase.transition(FlightPhase::Burn);
    h.ctx.phase.transition(FlightPhase::Coast);

    // Drive apogee detection normally so drogue fires through the public
    // control-loop entry point (no direct access to its deploy-instant
    // bookkeeping, which is private).
    for _ in 0..h.ctx.config.descents_to_apogee {
        h.parachute_state.kalman.altitude -= 10.0;
        h.tick();
    }
    assert_eq!(h.ctx.phase.current(), FlightPhase::DrogueDescent);

    // Altitude stays far above the AGL threshold the whole time, so only
    // the timeout path can advance us to MAIN_DESCENT. Ground keeps sending
    // heartbeats throughout, same as a real 10-minute drogue descent with an
    // intact ground link -- otherwise the much shorter heartbeat timeout
    // would latch a communication-loss abort first.
    h.parachute_state.kalman.altitude = 40_000.0;
    let timeout_ticks =
        (h.ctx.config.drogue_to_main_timeout.as_secs_f64() / h.dt.as_secs_f64()).ceil() as u32 + 1;
    let heartbeat_ticks = h.ctx.heartbeat.remaining();
    for i in 0..timeout_ticks {
        if i % heartbeat_ticks.max(1) == 0 {
            h.ctx.heartbeat.reset(heartbeat_ticks);
        }
        h.tick();
    }

    assert_eq!(h.ctx.phase.current(), FlightPhase::MainDescent);
}

/// Scenario 3: the ground link goes quiet; the heartbeat counter runs out
/// and the emergency monitor latches a communication-loss abort regardless
/// of what phase the vehicle was in.
#[test]
fn heartbeat_loss_during_flight_triggers_abort() {
    let mut h = Harness::new();
    h.ctx.phase.transition(FlightPhase::Arm);
    h.ctx.phase.transition(FlightPhase::Burn);

    let ticks = h.ctx.heartbeat.remaining() + 1;
    for _ in 0..ticks {
        h.tick();
    }

    assert_eq!(h.ctx.phase.current(), FlightPhase::AbortCommunicationError);
}

/// Scenario 4: ground sends an explicit abort mid-burn; the vent controller
/// takes over cycling the tank vent, and the injection valve -- left open
/// from the burn -- responds only to an explicit ground `CLOSE_INJ`, not
/// to the abort transition itself.
#[test]
fn ground_abort_during_burn_vents_and_injector_responds_only_to_ground_command() {
    let mut h = Harness::new();
    h.ctx.phase.transition(FlightPhase::Arm);

    // A manual injector command sent before the abort, while still armed,
    // must be ignored -- the guard is on abort phases only.
    h.send_command(command::CMD_OPEN_INJECTOR);
    h.tick();
    assert!(!h.actuators.injection_valve_is_open());

    h.ctx.phase.transition(FlightPhase::Burn);
    h.ctx.actuators.set_injection_valve(true).unwrap();

    h.send_command(command::CMD_ABORT);
    h.tick();
    assert_eq!(h.ctx.phase.current(), FlightPhase::AbortCommandReceived);
    // The abort transition alone does not touch the injector.
    assert!(h.actuators.injection_valve_is_open());

    h.send_command(command::CMD_CLOSE_INJECTOR);
    h.tick();
    assert!(!h.actuators.injection_valve_is_open());

    // Run the vent controller through several closed-dwell/open cycles
    // with the tank still over pressure, and record whether it was ever
    // observed open -- not just its final state.
    h.sensors
        .set_oxidizer_tank_pressure(h.ctx.config.tank_pressure_ceiling + 1.0);
    let mut observed_open = false;
    for _ in 0..100 {
        h.tick();
        observed_open |= h.actuators.vent_valve_is_open();
    }
    assert!(observed_open, "vent valve never opened during the abort");

    // Once pressure drops below the safe threshold, the next open cycle
    // closes the valve and it stays closed.
    h.sensors.set_oxidizer_tank_pressure(0.0);
    for _ in 0..50 {
        h.tick();
    }
    assert!(!h.actuators.vent_valve_is_open());
}

/// Scenario 5: an over-pressure reading on the pad, before arming, is still
/// caught by the emergency monitor -- abort is not gated on flight phase.
#[test]
fn over_pressure_in_prelaunch_aborts_immediately() {
    let mut h = Harness::new();
    h.sensors
        .set_oxidizer_tank_pressure(h.ctx.config.tank_pressure_ceiling + 1.0);
    h.tick();
    assert_eq!(h.ctx.phase.current(), FlightPhase::AbortOxidizerPressure);
}

/// Scenario 6: after any abort, a ground `RESET` returns the vehicle to
/// `PRELAUNCH` with command flags and the heartbeat counter restored.
#[test]
fn reset_after_abort_returns_to_prelaunch() {
    let mut h = Harness::new();
    h.send_command(command::CMD_ABORT);
    h.tick();
    assert!(h.ctx.phase.is_abort());

    h.send_command(command::CMD_RESET);
    h.tick();

    assert_eq!(h.ctx.phase.current(), FlightPhase::Prelaunch);
    assert!(h.ctx.heartbeat.remaining() > 0);
}
