//! Mutex-guarded snapshots of the latest sensor reading from each of the
//! five sensor sources. Each record has exactly one producer task and many
//! consumers; records are created before scheduling starts and live for the
//! process lifetime, mirroring the teacher's per-sensor `Shared` fields
//! (`altimeter`, `i2c1`, `i2c2`, ...) that are written by one ISR and read
//! by the control-loop tasks.
//!
//! The original firmware reserves `-1` for "no read yet / read failed"; we
//! use `Option<T>` instead, per the sentinel-replacement design note.

use std::sync::Mutex;

/// A mutex-guarded snapshot with an explicit "no valid reading yet" state,
/// replacing the original firmware's `-1` sentinel.
#[derive(Debug, Default)]
pub struct SensorRecord<T> {
    latest: Mutex<Option<T>>,
}

impl<T: Clone> SensorRecord<T> {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
        }
    }

    /// Producer-side: publish a new valid reading.
    pub fn publish(&self, value: T) {
        *self.latest.lock().expect("sensor mutex poisoned") = Some(value);
    }

    /// Producer-side: mark the record as having no valid reading (e.g. after
    /// a sustained sensor failure).
    pub fn invalidate(&self) {
        *self.latest.lock().expect("sensor mutex poisoned") = None;
    }

    /// Consumer-side: the most recently published valid value, if any.
    pub fn read(&self) -> Option<T> {
        self.latest.lock().expect("sensor mutex poisoned").clone()
    }
}

/// Three-axis IMU reading: accelerometer, gyroscope, and magnetometer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelGyroMagnetism {
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
}

/// Barometric pressure and temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Barometer {
    /// Pascals.
    pub pressure: f64,
    /// Degrees Celsius.
    pub temperature: f64,
}

/// Oxidizer tank pressure, in Pascals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OxidizerTankPressure {
    pub pressure: f64,
}

/// Combustion chamber pressure, in Pascals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CombustionChamberPressure {
    pub pressure: f64,
}

/// GPS fix, published once a `$GPGGA` frame has been assembled and (if
/// field parsing is wired up downstream) decoded. NMEA field parsing itself
/// is out of scope for this crate; `parsed_fix` is `None` until an external
/// collaborator fills it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gps {
    /// Raw `$GPGGA` sentence bytes, as assembled by the GPS ingress.
    pub nmea_buffer: Vec<u8>,
    /// Set when `nmea_buffer` holds a frame ready to be parsed.
    pub parse_flag: bool,
    /// Latitude/longitude, once parsed by an external collaborator.
    pub parsed_fix: Option<(f64, f64)>,
}

/// The five sensor records, bundled for convenient construction and sharing.
#[derive(Default)]
pub struct SensorRecords {
    pub imu: SensorRecord<AccelGyroMagnetism>,
    pub barometer: SensorRecord<Barometer>,
    pub oxidizer_tank_pressure: SensorRecord<OxidizerTankPressure>,
    pub chamber_pressure: SensorRecord<CombustionChamberPressure>,
    pub gps: SensorRecord<Gps>,
}

impl SensorRecords {
    pub fn new() -> Self {
        Self::default()
    }
}
