//! Ground-link commands: byte classification, the flight-phase queue and
//! the receive-side router that feeds it.

mod queue;
mod router;

pub use queue::{FlightPhaseQueue, QueueError};
pub use router::{GroundLinkRouter, Placement, RouteError, RouterStats};

use crate::config::*;

/// One byte received from the ground station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GroundCommand {
    Launch,
    Arm,
    Abort,
    ResetAvionics,
    Heartbeat,
    OpenInjectionValve,
    CloseInjectionValve,
    Unknown(u8),
}

impl GroundCommand {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            LAUNCH_CMD_BYTE => GroundCommand::Launch,
            ARM_CMD_BYTE => GroundCommand::Arm,
            ABORT_CMD_BYTE => GroundCommand::Abort,
            RESET_AVIONICS_CMD_BYTE => GroundCommand::ResetAvionics,
            HEARTBEAT_BYTE => GroundCommand::Heartbeat,
            OPEN_INJECTION_VALVE_BYTE => GroundCommand::OpenInjectionValve,
            CLOSE_INJECTION_VALVE_BYTE => GroundCommand::CloseInjectionValve,
            other => GroundCommand::Unknown(other),
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            GroundCommand::Launch => LAUNCH_CMD_BYTE,
            GroundCommand::Arm => ARM_CMD_BYTE,
            GroundCommand::Abort => ABORT_CMD_BYTE,
            GroundCommand::ResetAvionics => RESET_AVIONICS_CMD_BYTE,
            GroundCommand::Heartbeat => HEARTBEAT_BYTE,
            GroundCommand::OpenInjectionValve => OPEN_INJECTION_VALVE_BYTE,
            GroundCommand::CloseInjectionValve => CLOSE_INJECTION_VALVE_BYTE,
            GroundCommand::Unknown(byte) => byte,
        }
    }

    /// Commands serviced ahead of everything already queued.
    pub const fn is_abort_class(self) -> bool {
        matches!(self, GroundCommand::Abort)
    }
}

impl From<u8> for GroundCommand {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

#[cfg(test)]
mod tests;
