//! Flight-computer core: commands, shared sensor records, GPS sentence
//! capture and the ground-command path into the flight-phase state machine.
//!
//! Hardware independent; the firmware crate wires these into embassy tasks.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod command;
pub mod config;
pub mod ground;
pub mod nmea;
pub mod phase;
pub mod record;
pub mod telemetry;
pub mod wait;

pub use command::{Command, CommandError, CommandQueue, GlobalCommand, PayloadPool};
pub use ground::{FlightPhaseQueue, GroundCommand, GroundLinkRouter};
pub use nmea::{GpsLink, NmeaFramer};
pub use phase::{FlightPhase, PhaseMachine};
pub use record::{AccessError, SensorRecords, SharedRecord};
pub use telemetry::TelemetrySnapshot;
pub use wait::Wait;
