//! Flight-phase state machine and the abort/parachute/engine control loops
//! for a hybrid-propellant sounding rocket's avionics computer.
//!
//! The core is entirely `std`, testable on any host: device drivers live
//! behind the [`capability`] traits, with [`sim`] supplying host-backed
//! stand-ins. `main` wires real or simulated backends into a
//! [`control_context::ControlContext`] and spawns one OS thread per control
//! loop.

pub mod abort;
pub mod capability;
pub mod command;
pub mod config;
pub mod control_context;
pub mod emergency;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod logging;
pub mod parachute;
pub mod phase;
pub mod sensors;
pub mod sim;
pub mod telemetry;
