//! Crate-wide error type for the fallible boundaries of the system: sensor
//! reads, actuator writes, and ground-link I/O. Control-loop bodies never
//! propagate these with `?` out of a task; they're matched at the call site
//! and turned into a skip/retry/log per the error-handling policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvionicsError {
    #[error("sensor read failed: {0}")]
    SensorRead(&'static str),

    #[error("actuator write failed: {0}")]
    ActuatorWrite(&'static str),

    #[error("ground-link I/O failed: {0}")]
    GroundLink(&'static str),

    #[error("illegal phase transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: crate::phase::FlightPhase,
        to: crate::phase::FlightPhase,
    },
}
