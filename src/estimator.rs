//! One-dimensional altitude estimator: fuses a single accelerometer axis and
//! a single barometric pressure channel into `(altitude, velocity,
//! acceleration)` using a fixed-gain predict/correct update, run once per
//! parachute-controller tick.
//!
//! The contract (spec.md §4.3): altitude from pressure via the ISA
//! barometric formula, offset by the launch-site baseline; the predicted
//! state is the constant-acceleration extrapolation; the corrected state
//! blends prediction and measurement with fixed per-component gains. A
//! skipped tick (either measurement invalid) retains the prior state with
//! no side effects.

/// Altitude, velocity, and acceleration, private to the parachute
/// controller. Double precision per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    /// Meters, MSL.
    pub altitude: f64,
    /// m/s, positive up.
    pub velocity: f64,
    /// m/s^2, positive up (gravity already subtracted by the sensor task).
    pub acceleration: f64,
}

impl KalmanState {
    /// The state at rest on the pad, per spec.md §3.
    pub fn at_launch_site(launch_site_altitude: f64) -> Self {
        Self {
            altitude: launch_site_altitude,
            velocity: 0.0,
            acceleration: 0.0,
        }
    }
}

// ISA constants for the barometric altitude formula (sea-level reference).
const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;
const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
const TEMPERATURE_LAPSE_RATE: f64 = 0.0065; // K/m
const GRAVITY: f64 = 9.806_65; // m/s^2
const GAS_CONSTANT: f64 = 8.314_459_8; // J/(mol*K)
const MOLAR_MASS_AIR: f64 = 0.028_964_4; // kg/mol

/// Altitude above sea level implied by a barometric pressure reading, via
/// the ISA barometric formula.
pub fn pressure_to_altitude_msl(pressure_pa: f64) -> f64 {
    let exponent = (GAS_CONSTANT * TEMPERATURE_LAPSE_RATE) / (GRAVITY * MOLAR_MASS_AIR);
    (SEA_LEVEL_TEMPERATURE_K / TEMPERATURE_LAPSE_RATE)
        * (1.0 - (pressure_pa / SEA_LEVEL_PRESSURE_PA).powf(exponent))
}

/// Correction gains for the complementary blend. Fixed per spec.md §4.3
/// ("implementer's choice; document them"); chosen so the barometer
/// dominates the altitude estimate at steady state (it has no drift) while
/// the accelerometer dominates velocity tracking during fast maneuvers
/// (it has no lag).
const GAIN_ALTITUDE: f64 = 0.35;
const GAIN_VELOCITY: f64 = 0.15;

/// Advance the estimator one tick. `accel_meas` and `pressure_meas` are
/// `None` when the corresponding sensor read failed or hasn't produced a
/// fresh sample; in that case the tick is skipped and `state` is returned
/// unchanged, with no side effects (spec.md §4.3's sentinel handling).
pub fn update(
    state: KalmanState,
    accel_meas: Option<f64>,
    pressure_meas: Option<f64>,
    dt: f64,
    launch_site_altitude: f64,
) -> KalmanState {
    let (Some(a_meas), Some(p_meas)) = (accel_meas, pressure_meas) else {
        return state;
    };

    // Constant-acceleration prediction.
    let predicted = KalmanState {
        acceleration: a_meas,
        velocity: state.velocity + a_meas * dt,
        altitude: state.altitude + state.velocity * dt + 0.5 * a_meas * dt * dt,
    };

    // Barometric altitude, offset by the launch-site baseline so altitude
    // reads 0 AGL on the pad.
    let baro_altitude =
        launch_site_altitude + (pressure_to_altitude_msl(p_meas) - pressure_to_altitude_msl(
            pressure_at_altitude_msl_inverse(launch_site_altitude),
        ));

    let altitude_error = baro_altitude - predicted.altitude;

    KalmanState {
        acceleration: predicted.acceleration,
        velocity: predicted.velocity + GAIN_VELOCITY * altitude_error * dt,
        altitude: predicted.altitude + GAIN_ALTITUDE * altitude_error * dt,
    }
}

/// Inverse of [`pressure_to_altitude_msl`]: the pressure, in Pa, that the
/// ISA formula would report at a given MSL altitude. Used only to express
/// the launch-site baseline as a pressure offset.
fn pressure_at_altitude_msl_inverse(altitude_msl: f64) -> f64 {
    let exponent = (GRAVITY * MOLAR_MASS_AIR) / (GAS_CONSTANT * TEMPERATURE_LAPSE_RATE);
    SEA_LEVEL_PRESSURE_PA
        * (1.0 - (TEMPERATURE_LAPSE_RATE * altitude_msl) / SEA_LEVEL_TEMPERATURE_K).powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn skipped_tick_retains_prior_state() {
        let s = KalmanState {
            altitude: 100.0,
            velocity: 5.0,
            acceleration: -9.8,
        };
        assert_eq!(update(s, None, Some(90_000.0), 0.2, 1_401.0), s);
        assert_eq!(update(s, Some(-9.8), None, 0.2, 1_401.0), s);
        assert_eq!(update(s, None, None, 0.2, 1_401.0), s);
    }

    #[test]
    fn idempotent_under_zero_dt() {
        let s = KalmanState {
            altitude: 1_401.0,
            velocity: 10.0,
            acceleration: -9.8,
        };
        let p_meas = pressure_at_altitude_msl_inverse(1_401.0);
        let next = update(s, Some(-9.8), Some(p_meas), 0.0, 1_401.0);
        assert!((next.altitude - s.altitude).abs() < 1e-9);
        assert!((next.velocity - s.velocity).abs() < 1e-9);
        assert_eq!(next.acceleration, s.acceleration);
    }

    #[test]
    fn altitude_is_non_increasing_under_constant_downward_accel() {
        let mut state = KalmanState::at_launch_site(1_401.0);
        let dt = 0.2;
        for _ in 0..200 {
            let predicted_alt = state.altitude + state.velocity * dt - 0.5 * GRAVITY * dt * dt;
            let p_meas = pressure_at_altitude_msl_inverse(predicted_alt);
            let next = update(state, Some(-GRAVITY), Some(p_meas), dt, 1_401.0);
            assert!(next.altitude <= state.altitude + 1e-6);
            state = next;
        }
    }

    proptest! {
        #[test]
        fn idempotence_law_holds_for_any_state(
            altitude in 0.0..50_000.0f64,
            velocity in -500.0..500.0f64,
            acceleration in -50.0..50.0f64,
            accel_meas in -50.0..50.0f64,
        ) {
            let s = KalmanState { altitude, velocity, acceleration };
            let p_meas = pressure_at_altitude_msl_inverse(altitude.clamp(0.0, 40_000.0));
            let next = update(s, Some(accel_meas), Some(p_meas), 0.0, 1_401.0);
            prop_assert!((next.altitude - s.altitude).abs() < 1e-6);
            prop_assert!((next.velocity - s.velocity).abs() < 1e-6);
        }
    }
}
