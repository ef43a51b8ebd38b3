//! Trait boundary for everything this crate treats as an external
//! collaborator: peripheral init, device drivers, and the ground/GPS serial
//! links. Real hardware backends live outside this crate (out of scope);
//! [`crate::sim`] provides host-testable stand-ins so the core compiles and
//! runs on ordinary hardware with a simulator behind these traits.
//!
//! Modeled on the teacher's swappable per-sensor driver modules
//! (`drivers::baro_dps310`, `drivers::gps_ublox`, ...), expressed here as
//! traits instead of concrete modules since we need both a `sim` and a
//! (future, out-of-scope) real backend.

use crate::error::AvionicsError;
use crate::sensors::{
    AccelGyroMagnetism, Barometer, CombustionChamberPressure, OxidizerTankPressure,
};

/// Produces a sample or signals failure, once per call, at whatever period
/// the caller drives it. Device-specific calibration (raw-unit conversion,
/// gravity subtraction) is the implementer's responsibility; see spec.md
/// §4.3's numeric notes.
pub trait SensorIo: Send + Sync {
    fn read_imu(&self) -> Result<AccelGyroMagnetism, AvionicsError>;
    fn read_barometer(&self) -> Result<Barometer, AvionicsError>;
    fn read_oxidizer_tank_pressure(&self) -> Result<OxidizerTankPressure, AvionicsError>;
    fn read_chamber_pressure(&self) -> Result<CombustionChamberPressure, AvionicsError>;
}

/// Active-high actuator outputs: e-matches for drogue/main, solenoids for
/// the vent and injection valves. All operations are idempotent -- setting
/// an already-open valve open again is a no-op, matching the single-writer
/// GPIO-ownership discipline in spec.md §5.
pub trait Actuators: Send + Sync {
    fn set_vent_valve(&self, open: bool) -> Result<(), AvionicsError>;
    fn set_injection_valve(&self, open: bool) -> Result<(), AvionicsError>;
    fn fire_drogue_match(&self) -> Result<(), AvionicsError>;
    fn fire_main_match(&self) -> Result<(), AvionicsError>;

    /// Current commanded state, for tests and telemetry.
    fn vent_valve_is_open(&self) -> bool;
    fn injection_valve_is_open(&self) -> bool;
    fn drogue_match_is_fired(&self) -> bool;
    fn main_match_is_fired(&self) -> bool;
}

/// Ground-link serial: inbound single-byte commands, outbound telemetry
/// frames. Zero-timeout semantics at the interrupt boundary (spec.md §5) are
/// modeled by `try_recv_command_byte` returning `None` rather than blocking.
pub trait GroundLink: Send + Sync {
    /// Non-blocking receive of the next inbound command byte, if any.
    fn try_recv_command_byte(&self) -> Option<u8>;

    /// Non-blocking receive of the next inbound GPS serial byte, if any.
    fn try_recv_gps_byte(&self) -> Option<u8>;

    /// Transmit a fully framed telemetry packet.
    fn send_telemetry_frame(&self, frame: &[u8]) -> Result<(), AvionicsError>;
}
