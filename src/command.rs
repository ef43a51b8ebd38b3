//! Ground-link command dispatch and GPS frame assembly.
//!
//! Mirrors the teacher's `usb_preflight`/CRSF channel-mapping tasks in
//! spirit: a byte arrives off a serial link, gets matched against a small
//! fixed table, and flips a flag or counter that other tasks poll. Framed
//! here as pure functions over [`CommandFlags`] so the dispatch logic is
//! host-testable without a running scheduler.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::sensors::Gps;

/// Single-byte ground commands, per spec.md §4.4's wire table.
pub const CMD_LAUNCH: u8 = 0x20;
pub const CMD_ARM: u8 = 0x21;
pub const CMD_OPEN_INJECTOR: u8 = 0x2A;
pub const CMD_CLOSE_INJECTOR: u8 = 0x2B;
pub const CMD_ABORT: u8 = 0x2F;
pub const CMD_HEARTBEAT: u8 = 0x46;
pub const CMD_RESET: u8 = 0x4F;

/// Flags and counters toggled by inbound ground commands, polled by the
/// emergency-monitor and engine tasks on their own ticks. `Atomic`/`Mutex`
/// fields rather than a single mutex-guarded struct since each field has an
/// independent writer (command task) and reader (one other task), matching
/// the teacher's per-field `Shared` resources rather than one coarse lock.
#[derive(Default)]
pub struct CommandFlags {
    pub abort_cmd_received: std::sync::atomic::AtomicBool,
    pub reset_cmd_received: std::sync::atomic::AtomicBool,
    pub arm_cmd_received: std::sync::atomic::AtomicBool,
    /// Number of `LAUNCH` bytes received while armed; compared against
    /// `SystemConfig::launch_cmd_threshold`.
    pub launch_cmd_count: AtomicU32,
    pub open_injector_cmd_received: std::sync::atomic::AtomicBool,
    pub close_injector_cmd_received: std::sync::atomic::AtomicBool,
}

impl CommandFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every flag and counter, as on a ground `RESET`.
    pub fn reset(&self) {
        self.abort_cmd_received.store(false, Ordering::SeqCst);
        self.reset_cmd_received.store(false, Ordering::SeqCst);
        self.arm_cmd_received.store(false, Ordering::SeqCst);
        self.launch_cmd_count.store(0, Ordering::SeqCst);
        self.open_injector_cmd_received.store(false, Ordering::SeqCst);
        self.close_injector_cmd_received.store(false, Ordering::SeqCst);
    }
}

/// Dispatch a single inbound byte. Unrecognized bytes are dropped silently,
/// matching the original firmware's bare `switch` with no `default` arm.
pub fn dispatch_command_byte(byte: u8, flags: &CommandFlags) {
    match byte {
        CMD_LAUNCH => {
            flags.launch_cmd_count.fetch_add(1, Ordering::SeqCst);
        }
        CMD_ARM => flags.arm_cmd_received.store(true, Ordering::SeqCst),
        CMD_OPEN_INJECTOR => flags.open_injector_cmd_received.store(true, Ordering::SeqCst),
        CMD_CLOSE_INJECTOR => flags.close_injector_cmd_received.store(true, Ordering::SeqCst),
        CMD_ABORT => flags.abort_cmd_received.store(true, Ordering::SeqCst),
        // The heartbeat byte's only effect -- reloading the heartbeat timer
        // -- happens at the ingress call site, which holds the timer; there
        // is no flag for this dispatcher to set.
        CMD_HEARTBEAT => {}
        CMD_RESET => flags.reset_cmd_received.store(true, Ordering::SeqCst),
        _ => {}
    }
}

/// Assembles inbound GPS serial bytes into complete `$GPGGA` NMEA
/// sentences, per spec.md §4.4: accumulate bytes until either the buffer
/// holds a line terminator or exceeds the configured maximum, matching
/// against the `$GPGGA` talker/sentence ID; a non-matching or malformed
/// frame is dropped and the buffer reset rather than forwarded.
pub struct GpsFrameAssembler {
    buffer: Mutex<Vec<u8>>,
    max_len: usize,
}

const GPGGA_PREFIX: &[u8] = b"$GPGGA";

impl GpsFrameAssembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(max_len)),
            max_len,
        }
    }

    /// Feed one inbound byte. Returns `Some(frame)` once a complete,
    /// well-formed `$GPGGA` sentence has been assembled; the assembler's
    /// internal buffer is reset either way once a line terminator is seen
    /// or the buffer overflows.
    pub fn push_byte(&self, byte: u8) -> Option<Gps> {
        let mut buf = self.buffer.lock().expect("gps buffer mutex poisoned");

        if byte == b'\n' || byte == b'\r' {
            if buf.is_empty() {
                return None;
            }
            let frame = std::mem::take(&mut *buf);
            return Self::finish_frame(frame);
        }

        buf.push(byte);
        if buf.len() > self.max_len {
            buf.clear();
        }
        None
    }

    fn finish_frame(frame: Vec<u8>) -> Option<Gps> {
        if !frame.starts_with(GPGGA_PREFIX) {
            return None;
        }
        Some(Gps {
            nmea_buffer: frame,
            parse_flag: true,
            parsed_fix: None,
        })
    }
}
