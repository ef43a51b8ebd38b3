//! The shared handle passed to every control-loop task: phase cell, sensor
//! records, command flags, heartbeat timer, and the three capability trait
//! objects. Grounded on the teacher's RTIC `#[shared]` struct -- one block
//! of resources every task locks into, expressed here as an `Arc`-shared
//! plain struct since tasks are OS threads rather than RTIC-scheduled
//! handlers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::capability::{Actuators, GroundLink, SensorIo};
use crate::command::CommandFlags;
use crate::config::SystemConfig;
use crate::phase::PhaseCell;
use crate::sensors::SensorRecords;

/// Countdown of missed heartbeats, per spec.md §4.5. Decremented once per
/// emergency-monitor tick; reset to its configured ceiling whenever a
/// `HEARTBEAT` byte is dispatched. Reaching zero trips a communication-loss
/// abort.
#[derive(Default)]
pub struct HeartbeatCounter {
    remaining_ticks: AtomicU32,
}

impl HeartbeatCounter {
    pub fn new(initial_ticks: u32) -> Self {
        Self {
            remaining_ticks: AtomicU32::new(initial_ticks),
        }
    }

    /// Decrement by one tick, saturating at zero. Returns the new value.
    pub fn tick(&self) -> u32 {
        self.remaining_ticks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_sub(1))
            })
            .expect("fetch_update closure never returns None");
        self.remaining_ticks.load(Ordering::SeqCst)
    }

    pub fn reset(&self, initial_ticks: u32) {
        self.remaining_ticks.store(initial_ticks, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_ticks.load(Ordering::SeqCst)
    }
}

/// Everything the control-loop tasks need, bundled behind one `Arc` so each
/// spawned thread gets a cheap clone of the handle rather than a bespoke
/// argument list.
pub struct ControlContext {
    pub config: SystemConfig,
    pub phase: PhaseCell,
    pub sensors: SensorRecords,
    pub flags: CommandFlags,
    pub heartbeat: HeartbeatCounter,
    pub sensor_io: Arc<dyn SensorIo>,
    pub actuators: Arc<dyn Actuators>,
    pub ground_link: Arc<dyn GroundLink>,
}

impl ControlContext {
    pub fn new(
        config: SystemConfig,
        sensor_io: Arc<dyn SensorIo>,
        actuators: Arc<dyn Actuators>,
        ground_link: Arc<dyn GroundLink>,
    ) -> Arc<Self> {
        let heartbeat_ticks =
            (config.heartbeat_timeout.as_secs_f64() / config.control_tick.as_secs_f64()).ceil() as u32;
        Arc::new(Self {
            config,
            phase: PhaseCell::default(),
            sensors: SensorRecords::new(),
            flags: CommandFlags::new(),
            heartbeat: HeartbeatCounter::new(heartbeat_ticks),
            sensor_io,
            actuators,
            ground_link,
        })
    }

    /// Reinitialize everything a ground `RESET` touches: phase back to
    /// `PRELAUNCH`, command flags cleared, heartbeat counter refilled. Sensor
    /// records and the capability trait objects are left as-is -- they
    /// represent hardware state, not flight-software state.
    pub fn reset(&self) {
        self.phase.transition(crate::phase::FlightPhase::Prelaunch);
        self.flags.reset();
        let heartbeat_ticks = (self.config.heartbeat_timeout.as_secs_f64()
            / self.config.control_tick.as_secs_f64())
        .ceil() as u32;
        self.heartbeat.reset(heartbeat_ticks);
    }
}
