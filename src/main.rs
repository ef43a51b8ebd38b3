//! Avionics computer entry point: wires a [`ControlContext`] to simulator
//! backends and spawns one OS thread per control loop.
//!
//! Thread spawn order mirrors the teacher's RTIC task priority list (lowest
//! latency tolerance first): emergency monitor, then abort vent control,
//! then engine control, then parachute control, then ground-link ingress,
//! then telemetry transmission. Each loop paces itself against an absolute
//! next-wake instant rather than sleeping a fixed delta, so a slow tick
//! doesn't accumulate drift.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use avionics_core::capability::GroundLink;
use avionics_core::command::{self, GpsFrameAssembler};
use avionics_core::config::SystemConfig;
use avionics_core::control_context::ControlContext;
use avionics_core::sim::{SimActuators, SimGroundLink, SimSensors};
use avionics_core::{abort, emergency, engine, logging, parachute, telemetry};

fn main() {
    logging::init();

    let config = SystemConfig::default();
    let tick = config.control_tick;

    let sensor_io = Arc::new(SimSensors::new());
    let actuators = Arc::new(SimActuators::new());
    let ground_link = Arc::new(SimGroundLink::new());

    let ctx = ControlContext::new(config, sensor_io, actuators, ground_link.clone());

    log::info!("avionics core starting, control tick = {:?}", tick);

    let handles = vec![
        spawn_loop("emergency", tick, ctx.clone(), move |ctx, _now| {
            emergency::tick(ctx)
        }),
        spawn_loop("abort", tick, ctx.clone(), {
            let mut controller = abort::AbortVentController::new(Instant::now());
            move |ctx, now| abort::tick(ctx, &mut controller, now)
        }),
        spawn_loop("engine", tick, ctx.clone(), {
            let mut state = engine::EngineState::new();
            move |ctx, now| engine::tick(ctx, &mut state, now)
        }),
        spawn_loop("parachute", tick, ctx.clone(), {
            let mut state = parachute::ParachuteState::new(ctx.config.launch_site_altitude);
            move |ctx, now| parachute::tick(ctx, &mut state, now, tick)
        }),
        spawn_sensor_ingest(ctx.clone(), tick),
        spawn_ground_link_ingress(ctx.clone(), ground_link.clone()),
        spawn_telemetry_tx(ctx.clone(), tick),
    ];

    for handle in handles {
        if let Err(err) = handle.join() {
            log::error!("control thread panicked: {:?}", err);
        }
    }
}

/// Spawn a control loop that calls `body` once per `tick`, waking at
/// absolute instants (`start + n * tick`) so a single slow iteration
/// doesn't push every subsequent wake later.
fn spawn_loop<F>(
    name: &'static str,
    tick: std::time::Duration,
    ctx: Arc<ControlContext>,
    mut body: F,
) -> thread::JoinHandle<()>
where
    F: FnMut(&ControlContext, Instant) + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let start = Instant::now();
            let mut n: u32 = 0;
            loop {
                let now = Instant::now();
                body(&ctx, now);

                n = n.wrapping_add(1);
                let next_wake = start + tick * n;
                let sleep_for = next_wake.saturating_duration_since(Instant::now());
                if !sleep_for.is_zero() {
                    thread::sleep(sleep_for);
                }
            }
        })
        .expect("failed to spawn control thread")
}

/// Samples the IMU and barometer every tick and publishes them into
/// `ctx.sensors`, the only producer of those two records. The oxidizer
/// tank and chamber pressure records are instead published by the
/// emergency monitor and engine controller respectively, since those tasks
/// already read them to evaluate abort/burn conditions and a second reader
/// of the same channel would be redundant.
fn spawn_sensor_ingest(ctx: Arc<ControlContext>, tick: std::time::Duration) -> thread::JoinHandle<()> {
    spawn_loop("sensor-ingest", tick, ctx, move |ctx, _now| {
        match ctx.sensor_io.read_imu() {
            Ok(reading) => ctx.sensors.imu.publish(reading),
            Err(_) => ctx.sensors.imu.invalidate(),
        }
        match ctx.sensor_io.read_barometer() {
            Ok(reading) => ctx.sensors.barometer.publish(reading),
            Err(_) => ctx.sensors.barometer.invalidate(),
        }
    })
}

/// Drains inbound ground-command and GPS bytes and dispatches them, plus
/// refills the heartbeat counter on `HEARTBEAT` bytes. Runs at the same
/// tick as the other control loops rather than blocking on I/O, since
/// [`avionics_core::capability::GroundLink`] is non-blocking by contract.
fn spawn_ground_link_ingress(
    ctx: Arc<ControlContext>,
    ground_link: Arc<SimGroundLink>,
) -> thread::JoinHandle<()> {
    let tick = ctx.config.control_tick;
    let gps_assembler = GpsFrameAssembler::new(ctx.config.nmea_max_len);
    spawn_loop("ground-link", tick, ctx, move |ctx, _now| {
        while let Some(byte) = ground_link.try_recv_command_byte() {
            if byte == command::CMD_HEARTBEAT {
                let heartbeat_ticks = (ctx.config.heartbeat_timeout.as_secs_f64()
                    / ctx.config.control_tick.as_secs_f64())
                .ceil() as u32;
                ctx.heartbeat.reset(heartbeat_ticks);
            }
            command::dispatch_command_byte(byte, &ctx.flags);
        }
        while let Some(byte) = ground_link.try_recv_gps_byte() {
            if let Some(frame) = gps_assembler.push_byte(byte) {
                ctx.sensors.gps.publish(frame);
            }
        }
    })
}

fn spawn_telemetry_tx(ctx: Arc<ControlContext>, tick: std::time::Duration) -> thread::JoinHandle<()> {
    spawn_loop("telemetry", tick, ctx, move |ctx, _now| {
        let frame = telemetry::encode_frame(ctx);
        if let Err(err) = ctx.ground_link.send_telemetry_frame(&frame) {
            log::warn!("telemetry send failed: {:?}", err);
        }

        #[cfg(feature = "print-status")]
        log::info!(
            "phase={:?} heartbeat_remaining={}",
            ctx.phase.current(),
            ctx.heartbeat.remaining()
        );
    })
}
