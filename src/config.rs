//! Tunable constants, collected into one struct so tests can override tick
//! periods and thresholds without touching control logic.
//!
//! Values mirror the constants summary in the flight-phase/parachute/abort
//! specification; defaults are documented inline where the source of the
//! number matters.

use std::time::Duration;

/// All tunable parameters for one vehicle. Construct with [`SystemConfig::default`]
/// and override individual fields for test fixtures or per-vehicle calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Tick period for the parachute, emergency-shutoff, and abort control loops.
    pub control_tick: Duration,

    /// Consecutive descending ticks required to declare apogee in `COAST`.
    pub descents_to_apogee: u32,

    /// Altitude above the launch site, in meters, below which main deploys
    /// during `DROGUE_DESCENT`.
    pub main_deploy_altitude_agl: f64,

    /// Maximum time to remain in `DROGUE_DESCENT` before forcing main deploy.
    pub drogue_to_main_timeout: Duration,

    /// Ground-link heartbeat silence before the emergency monitor declares
    /// `ABORT_COMMUNICATION_ERROR`.
    pub heartbeat_timeout: Duration,

    /// Oxidizer tank pressure ceiling, in Pa, above which the emergency
    /// monitor declares `ABORT_OXIDIZER_PRESSURE`.
    pub tank_pressure_ceiling: f64,

    /// Oxidizer tank pressure, in Pa, the abort controller vents down to
    /// before closing the vent valve.
    pub tank_pressure_safe: f64,

    /// Maximum single open duration for the vent valve during an abort cycle.
    pub vent_max_open: Duration,

    /// Minimum time the vent valve stays closed between open cycles.
    pub vent_min_closed: Duration,

    /// Number of `LAUNCH` command bytes required, while `ARM`, before the
    /// engine controller transitions to `BURN`.
    pub launch_cmd_threshold: u32,

    /// Burn duration after which the engine controller transitions
    /// `BURN -> COAST` (see DESIGN.md's Open Question resolution).
    pub burn_duration: Duration,

    /// Combustion-chamber pressure ceiling, in Pa; sustained excursion above
    /// this during `BURN` requests `ABORT_UNSPECIFIED`.
    pub chamber_pressure_ceiling: f64,

    /// Launch site altitude above sea level, in meters. Baseline for the
    /// barometric altitude estimate and for `main_deploy_altitude_agl`.
    pub launch_site_altitude: f64,

    /// Maximum length of an NMEA sentence the GPS frame assembler will buffer.
    pub nmea_max_len: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            control_tick: Duration::from_millis(200),
            descents_to_apogee: 3,
            main_deploy_altitude_agl: 457.0,
            drogue_to_main_timeout: Duration::from_secs(10 * 60),
            heartbeat_timeout: Duration::from_secs(3 * 60),
            // Representative ceiling for a small hybrid oxidizer tank; tune per vehicle.
            tank_pressure_ceiling: 5_500_000.0,
            tank_pressure_safe: 3_000_000.0,
            vent_max_open: Duration::from_secs(8),
            vent_min_closed: Duration::from_secs(4),
            launch_cmd_threshold: 1,
            // Representative hybrid-motor burn time; tune per vehicle.
            burn_duration: Duration::from_secs(12),
            chamber_pressure_ceiling: 6_000_000.0,
            launch_site_altitude: 1_401.0, // meters; matches the reference launch site.
            nmea_max_len: 82,
        }
    }
}
