//! The parachute controller: the single consumer of the altitude estimator,
//! driving drogue and main deployment off the flight phase and the
//! estimated descent rate. Grounded on the teacher's `flight_ctrls` task
//! structure -- one control loop, dispatched per-phase, holding its working
//! state across ticks in locals rather than shared globals.
//!
//! Unifies the original firmware's separate `detectApogee` counter and
//! `kalmanFilterState` struct into one [`ParachuteState`] so both live
//! behind a single owner, per the design note in spec.md §9.

use std::time::{Duration, Instant};

use crate::control_context::ControlContext;
use crate::estimator::{self, KalmanState};
use crate::phase::FlightPhase;

/// Per-tick working state for the parachute controller, owned by the thread
/// that runs [`tick`] and threaded through by `&mut` -- never shared, so no
/// lock is needed around it.
pub struct ParachuteState {
    pub kalman: KalmanState,
    /// The previous tick's estimated altitude, compared against the current
    /// tick's altitude during `COAST` to detect descent.
    prev_altitude: f64,
    /// Consecutive ticks where altitude strictly decreased from the previous
    /// tick, seen during `COAST`; compared against `descents_to_apogee`
    /// before declaring apogee.
    descent_ticks: u32,
    /// Set the instant drogue deployment fires, so `DROGUE_DESCENT` can
    /// fall back to a timed main deployment if altitude never crosses the
    /// configured AGL threshold (e.g. a stuck or miscalibrated barometer).
    drogue_deployed_at: Option<Instant>,
}

impl ParachuteState {
    pub fn new(launch_site_altitude: f64) -> Self {
        Self {
            kalman: KalmanState::at_launch_site(launch_site_altitude),
            prev_altitude: launch_site_altitude,
            descent_ticks: 0,
            drogue_deployed_at: None,
        }
    }
}

/// Run one control tick of the parachute controller. `now` is passed in
/// (rather than read via `Instant::now()` internally) so tests can drive
/// the timeout path deterministically.
pub fn tick(ctx: &ControlContext, state: &mut ParachuteState, now: Instant, dt: Duration) {
    let phase = ctx.phase.current();

    if phase.is_abort() {
        return;
    }

    match phase {
        FlightPhase::Prelaunch | FlightPhase::Arm => {
            // Idle: keep the estimator pinned to the pad so BURN starts from
            // a known-good state regardless of how long ARM was held.
            state.kalman = KalmanState::at_launch_site(ctx.config.launch_site_altitude);
            state.prev_altitude = ctx.config.launch_site_altitude;
            state.descent_ticks = 0;
            state.drogue_deployed_at = None;
        }
        FlightPhase::Burn => {
            update_estimate(ctx, state, dt);
            state.prev_altitude = state.kalman.altitude;
            state.descent_ticks = 0;
        }
        FlightPhase::Coast => {
            let altitude_before = state.prev_altitude;
            update_estimate(ctx, state, dt);
            if state.kalman.altitude < altitude_before {
                state.descent_ticks += 1;
            } else {
                state.descent_ticks = 0;
            }
            state.prev_altitude = state.kalman.altitude;
            if state.descent_ticks >= ctx.config.descents_to_apogee {
                if ctx.actuators.fire_drogue_match().is_ok() {
                    state.drogue_deployed_at = Some(now);
                    ctx.phase.transition(FlightPhase::DrogueDescent);
                }
            }
        }
        FlightPhase::DrogueDescent => {
            update_estimate(ctx, state, dt);
            let altitude_agl = state.kalman.altitude - ctx.config.launch_site_altitude;
            let timed_out = state
                .drogue_deployed_at
                .map(|t| now.duration_since(t) >= ctx.config.drogue_to_main_timeout)
                .unwrap_or(false);
            if altitude_agl <= ctx.config.main_deploy_altitude_agl || timed_out {
                if ctx.actuators.fire_main_match().is_ok() {
                    ctx.phase.transition(FlightPhase::MainDescent);
                }
            }
        }
        FlightPhase::MainDescent => {
            update_estimate(ctx, state, dt);
        }
        FlightPhase::AbortCommandReceived
        | FlightPhase::AbortOxidizerPressure
        | FlightPhase::AbortUnspecified
        | FlightPhase::AbortCommunicationError => unreachable!("handled by the early return above"),
    }
}

fn update_estimate(ctx: &ControlContext, state: &mut ParachuteState, dt: Duration) {
    let accel = ctx.sensors.imu.read().map(|r| r.accel_z);
    let pressure = ctx.sensors.barometer.read().map(|r| r.pressure);
    state.kalman = estimator::update(
        state.kalman,
        accel,
        pressure,
        dt.as_secs_f64(),
        ctx.config.launch_site_altitude,
    );
}
