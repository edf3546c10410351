//! Flight-computer tuning constants.
//!
//! Everything here is fixed at build time; the firmware has no runtime
//! configuration store.

use embassy_time::Duration;

// ── Flight-phase command queue ────────────────────────────────────────────────

/// Depth of the queue between the ground-link receiver and the flight-phase task.
pub const FLIGHT_PHASE_QUEUE_SIZE: usize = 10;

/// Depth of the queue carrying phase-event commands to the telemetry task.
pub const EVENT_QUEUE_SIZE: usize = 8;

// ── Ground-link byte table ────────────────────────────────────────────────────

pub const LAUNCH_CMD_BYTE: u8 = 0x20;
pub const ARM_CMD_BYTE: u8 = 0x21;
pub const ABORT_CMD_BYTE: u8 = 0x2F;
pub const RESET_AVIONICS_CMD_BYTE: u8 = 0x4F;
pub const HEARTBEAT_BYTE: u8 = 0x46;
pub const OPEN_INJECTION_VALVE_BYTE: u8 = 0x2A;
pub const CLOSE_INJECTION_VALVE_BYTE: u8 = 0x2B;

/// Armed vehicles abort if the ground station goes quiet for this long.
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);

// ── GPS ───────────────────────────────────────────────────────────────────────

/// Longest NMEA line kept, prefix included, terminator excluded.
pub const NMEA_MAX_LENGTH: usize = 128;

/// Only sentences starting with this talker + type are captured.
pub const GPS_SENTENCE_PREFIX: &[u8] = b"$GPGGA";

// ── Command payloads ──────────────────────────────────────────────────────────

pub const PAYLOAD_SLOTS: usize = 16;
pub const PAYLOAD_SLOT_SIZE: usize = 64;

/// Outstanding payloads beyond this count are treated as a leak.
pub const MAX_LIVE_PAYLOADS: u16 = 12;

// ── Task timing ───────────────────────────────────────────────────────────────

pub const SENSOR_PERIOD: Duration = Duration::from_hz(100);
pub const PRESSURE_PERIOD: Duration = Duration::from_hz(50);
pub const TELEMETRY_PERIOD: Duration = Duration::from_hz(20);
/// No GPS byte for this long means the receiver went quiet; any partial
/// line is stale.
pub const GPS_SILENCE_TIMEOUT: Duration = Duration::from_secs(2);
/// Receive buffer for one idle-delimited burst. A whole sentence burst at
/// 9600 baud fits, so a read never ends mid-burst for lack of room.
pub const GPS_RX_BUFFER: usize = 1024;
pub const DEBUG_POLL_PERIOD: Duration = Duration::from_millis(100);
/// How long the flight-phase task sleeps on an empty queue before checking the heartbeat.
pub const FLIGHT_PHASE_POLL: Duration = Duration::from_millis(100);
/// Upper bound a task-context consumer waits for a record lock.
pub const RECORD_LOCK_TIMEOUT: Duration = Duration::from_millis(5);

pub const PHASE_DISPLAY_PERIOD: Duration = Duration::from_millis(1000);
pub const PHASE_BLINK_PERIOD: Duration = Duration::from_millis(100);
