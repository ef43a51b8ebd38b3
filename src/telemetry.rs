//! Outbound telemetry framing: a fixed-layout binary snapshot of flight
//! state, trailed by a CRC32 checksum. Grounded on `makair-telemetry`'s
//! frame serializers, which use the same crate (`crc32fast`) to checksum a
//! fixed-layout binary struct for transmission over a lossy serial link.
//!
//! Layout (little-endian), 130 bytes before the checksum:
//!
//! | offset | bytes | field                              |
//! |--------|-------|-------------------------------------|
//! | 0      | 1     | flight phase (wire repr)             |
//! | 1      | 8     | timestamp, ms since Unix epoch (UTC) |
//! | 9      | 8x9   | IMU: accel xyz, gyro xyz, mag xyz    |
//! | 81     | 8x2   | barometer: pressure, temperature     |
//! | 97     | 8     | oxidizer tank pressure               |
//! | 105    | 8     | combustion chamber pressure          |
//! | 113    | 1     | GPS fix valid flag                   |
//! | 114    | 8x2   | GPS fix: latitude, longitude         |
//! | 130    | 4     | CRC32 of bytes 0..130                |

use chrono::Utc;
use crc32fast::Hasher;

use crate::control_context::ControlContext;
use crate::phase::FlightPhase;

pub const FRAME_LEN: usize = 134;
const CHECKSUM_OFFSET: usize = 130;

/// Build one telemetry frame from the current shared state. Reads whatever
/// the sensor records hold at the moment of the call; a record with no
/// valid reading yet is encoded as all-zero bytes with, for the GPS fix,
/// its valid flag cleared.
pub fn encode_frame(ctx: &ControlContext) -> [u8; FRAME_LEN] {
    let mut buf = [0u8; FRAME_LEN];

    buf[0] = u8::from(ctx.phase.current());
    buf[1..9].copy_from_slice(&Utc::now().timestamp_millis().to_le_bytes());

    if let Some(imu) = ctx.sensors.imu.read() {
        let fields = [
            imu.accel_x, imu.accel_y, imu.accel_z, imu.gyro_x, imu.gyro_y, imu.gyro_z, imu.mag_x,
            imu.mag_y, imu.mag_z,
        ];
        write_f64_array(&mut buf, 9, &fields);
    }

    if let Some(baro) = ctx.sensors.barometer.read() {
        write_f64_array(&mut buf, 81, &[baro.pressure, baro.temperature]);
    }

    if let Some(ox) = ctx.sensors.oxidizer_tank_pressure.read() {
        write_f64(&mut buf, 97, ox.pressure);
    }

    if let Some(chamber) = ctx.sensors.chamber_pressure.read() {
        write_f64(&mut buf, 105, chamber.pressure);
    }

    if let Some(gps) = ctx.sensors.gps.read() {
        if let Some((lat, lon)) = gps.parsed_fix {
            buf[113] = 1;
            write_f64_array(&mut buf, 114, &[lat, lon]);
        }
    }

    let mut hasher = Hasher::new();
    hasher.update(&buf[..CHECKSUM_OFFSET]);
    let checksum = hasher.finalize();
    buf[CHECKSUM_OFFSET..FRAME_LEN].copy_from_slice(&checksum.to_le_bytes());

    buf
}

/// The fields decodable from a received frame, for ground-station use and
/// for round-trip tests. Returns `None` if the checksum doesn't match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFrame {
    pub phase: Option<FlightPhase>,
    pub timestamp_millis: i64,
    pub accel: (f64, f64, f64),
    pub barometer_pressure: f64,
    pub oxidizer_tank_pressure: f64,
    pub chamber_pressure: f64,
    pub gps_fix: Option<(f64, f64)>,
}

pub fn decode_frame(buf: &[u8; FRAME_LEN]) -> Option<DecodedFrame> {
    let mut hasher = Hasher::new();
    hasher.update(&buf[..CHECKSUM_OFFSET]);
    let expected = hasher.finalize();
    let actual = u32::from_le_bytes(buf[CHECKSUM_OFFSET..FRAME_LEN].try_into().ok()?);
    if expected != actual {
        return None;
    }

    Some(DecodedFrame {
        phase: FlightPhase::try_from(buf[0]).ok(),
        timestamp_millis: i64::from_le_bytes(buf[1..9].try_into().ok()?),
        accel: (read_f64(buf, 9), read_f64(buf, 17), read_f64(buf, 25)),
        barometer_pressure: read_f64(buf, 81),
        oxidizer_tank_pressure: read_f64(buf, 97),
        chamber_pressure: read_f64(buf, 105),
        gps_fix: if buf[113] == 1 {
            Some((read_f64(buf, 114), read_f64(buf, 122)))
        } else {
            None
        },
    })
}

fn write_f64(buf: &mut [u8], offset: usize, value: f64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn write_f64_array(buf: &mut [u8], offset: usize, values: &[f64]) {
    for (i, v) in values.iter().enumerate() {
        write_f64(buf, offset + i * 8, *v);
    }
}

fn read_f64(buf: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(buf[offset..offset + 8].try_into().expect("fixed-size slice"))
}
