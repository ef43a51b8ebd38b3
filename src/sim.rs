//! Host-testable simulator backends for the three capability traits.
//!
//! Grounded on the dedicated `simulation` workspace member of the
//! satellite-telemetry pack sibling: rather than mocking each trait method
//! individually, one scriptable struct drives a whole flight profile and the
//! traits read off it. Every field is behind a mutex so the simulator can be
//! shared across the same threads that would hold real driver handles.

use std::sync::Mutex;

use crate::capability::{Actuators, GroundLink, SensorIo};
use crate::error::AvionicsError;
use crate::sensors::{AccelGyroMagnetism, Barometer, CombustionChamberPressure, OxidizerTankPressure};

/// A sensor suite whose readings are pushed in by a test or demo driver
/// rather than sampled from real hardware. Each `read_*` call consumes
/// nothing; it simply reports whatever was last set.
#[derive(Default)]
pub struct SimSensors {
    imu: Mutex<AccelGyroMagnetism>,
    barometer: Mutex<Barometer>,
    oxidizer_tank_pressure: Mutex<OxidizerTankPressure>,
    chamber_pressure: Mutex<CombustionChamberPressure>,
    imu_fails: Mutex<bool>,
    barometer_fails: Mutex<bool>,
    oxidizer_fails: Mutex<bool>,
    chamber_fails: Mutex<bool>,
}

impl SimSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_imu(&self, reading: AccelGyroMagnetism) {
        *self.imu.lock().expect("sim mutex poisoned") = reading;
    }

    pub fn set_barometer(&self, reading: Barometer) {
        *self.barometer.lock().expect("sim mutex poisoned") = reading;
    }

    pub fn set_oxidizer_tank_pressure(&self, pressure: f64) {
        *self.oxidizer_tank_pressure.lock().expect("sim mutex poisoned") =
            OxidizerTankPressure { pressure };
    }

    pub fn set_chamber_pressure(&self, pressure: f64) {
        *self.chamber_pressure.lock().expect("sim mutex poisoned") =
            CombustionChamberPressure { pressure };
    }

    /// Make the next (and all subsequent, until un-set) reads of a channel
    /// fail, to exercise the "sensor read failed" path.
    pub fn set_imu_fails(&self, fails: bool) {
        *self.imu_fails.lock().expect("sim mutex poisoned") = fails;
    }

    pub fn set_barometer_fails(&self, fails: bool) {
        *self.barometer_fails.lock().expect("sim mutex poisoned") = fails;
    }

    pub fn set_oxidizer_fails(&self, fails: bool) {
        *self.oxidizer_fails.lock().expect("sim mutex poisoned") = fails;
    }

    pub fn set_chamber_fails(&self, fails: bool) {
        *self.chamber_fails.lock().expect("sim mutex poisoned") = fails;
    }
}

impl SensorIo for SimSensors {
    fn read_imu(&self) -> Result<AccelGyroMagnetism, AvionicsError> {
        if *self.imu_fails.lock().expect("sim mutex poisoned") {
            return Err(AvionicsError::SensorRead("imu"));
        }
        Ok(*self.imu.lock().expect("sim mutex poisoned"))
    }

    fn read_barometer(&self) -> Result<Barometer, AvionicsError> {
        if *self.barometer_fails.lock().expect("sim mutex poisoned") {
            return Err(AvionicsError::SensorRead("barometer"));
        }
        Ok(*self.barometer.lock().expect("sim mutex poisoned"))
    }

    fn read_oxidizer_tank_pressure(&self) -> Result<OxidizerTankPressure, AvionicsError> {
        if *self.oxidizer_fails.lock().expect("sim mutex poisoned") {
            return Err(AvionicsError::SensorRead("oxidizer_tank_pressure"));
        }
        Ok(*self.oxidizer_tank_pressure.lock().expect("sim mutex poisoned"))
    }

    fn read_chamber_pressure(&self) -> Result<CombustionChamberPressure, AvionicsError> {
        if *self.chamber_fails.lock().expect("sim mutex poisoned") {
            return Err(AvionicsError::SensorRead("chamber_pressure"));
        }
        Ok(*self.chamber_pressure.lock().expect("sim mutex poisoned"))
    }
}

/// Actuator outputs recorded in memory instead of driving real GPIO/PWM.
#[derive(Default)]
pub struct SimActuators {
    vent_valve_open: Mutex<bool>,
    injection_valve_open: Mutex<bool>,
    drogue_fired: Mutex<bool>,
    main_fired: Mutex<bool>,
}

impl SimActuators {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actuators for SimActuators {
    fn set_vent_valve(&self, open: bool) -> Result<(), AvionicsError> {
        *self.vent_valve_open.lock().expect("sim mutex poisoned") = open;
        Ok(())
    }

    fn set_injection_valve(&self, open: bool) -> Result<(), AvionicsError> {
        *self.injection_valve_open.lock().expect("sim mutex poisoned") = open;
        Ok(())
    }

    fn fire_drogue_match(&self) -> Result<(), AvionicsError> {
        *self.drogue_fired.lock().expect("sim mutex poisoned") = true;
        Ok(())
    }

    fn fire_main_match(&self) -> Result<(), AvionicsError> {
        *self.main_fired.lock().expect("sim mutex poisoned") = true;
        Ok(())
    }

    fn vent_valve_is_open(&self) -> bool {
        *self.vent_valve_open.lock().expect("sim mutex poisoned")
    }

    fn injection_valve_is_open(&self) -> bool {
        *self.injection_valve_open.lock().expect("sim mutex poisoned")
    }

    fn drogue_match_is_fired(&self) -> bool {
        *self.drogue_fired.lock().expect("sim mutex poisoned")
    }

    fn main_match_is_fired(&self) -> bool {
        *self.main_fired.lock().expect("sim mutex poisoned")
    }
}

/// A ground/GPS link backed by in-memory queues instead of a UART. Tests
/// push bytes with `push_command_byte`/`push_gps_byte`; sent telemetry
/// frames accumulate in `sent_frames` for inspection.
#[derive(Default)]
pub struct SimGroundLink {
    command_bytes: Mutex<std::collections::VecDeque<u8>>,
    gps_bytes: Mutex<std::collections::VecDeque<u8>>,
    sent_frames: Mutex<Vec<Vec<u8>>>,
}

impl SimGroundLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_command_byte(&self, byte: u8) {
        self.command_bytes.lock().expect("sim mutex poisoned").push_back(byte);
    }

    pub fn push_command_bytes(&self, bytes: &[u8]) {
        let mut queue = self.command_bytes.lock().expect("sim mutex poisoned");
        queue.extend(bytes.iter().copied());
    }

    pub fn push_gps_byte(&self, byte: u8) {
        self.gps_bytes.lock().expect("sim mutex poisoned").push_back(byte);
    }

    pub fn push_gps_bytes(&self, bytes: &[u8]) {
        let mut queue = self.gps_bytes.lock().expect("sim mutex poisoned");
        queue.extend(bytes.iter().copied());
    }

    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent_frames.lock().expect("sim mutex poisoned").clone()
    }
}

impl GroundLink for SimGroundLink {
    fn try_recv_command_byte(&self) -> Option<u8> {
        self.command_bytes.lock().expect("sim mutex poisoned").pop_front()
    }

    fn try_recv_gps_byte(&self) -> Option<u8> {
        self.gps_bytes.lock().expect("sim mutex poisoned").pop_front()
    }

    fn send_telemetry_frame(&self, frame: &[u8]) -> Result<(), AvionicsError> {
        self.sent_frames.lock().expect("sim mutex poisoned").push(frame.to_vec());
        Ok(())
    }
}
