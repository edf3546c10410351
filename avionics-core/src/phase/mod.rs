//! Flight-phase state machine driven by ground commands.

use embassy_time::Instant;

use crate::config::HEARTBEAT_TIMEOUT;
use crate::ground::GroundCommand;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightPhase {
    Prelaunch = 0,
    Armed = 1,
    Burn = 2,
    Coast = 3,
    DrogueDescent = 4,
    MainDescent = 5,
    Abort = 6,
}

impl FlightPhase {
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Status LED blinks per display period.
    pub const fn blink_count(self) -> u8 {
        self.index() + 1
    }

    pub const fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => FlightPhase::Prelaunch,
            1 => FlightPhase::Armed,
            2 => FlightPhase::Burn,
            3 => FlightPhase::Coast,
            4 => FlightPhase::DrogueDescent,
            5 => FlightPhase::MainDescent,
            6 => FlightPhase::Abort,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            FlightPhase::Prelaunch => "PRELAUNCH",
            FlightPhase::Armed => "ARMED",
            FlightPhase::Burn => "BURN",
            FlightPhase::Coast => "COAST",
            FlightPhase::DrogueDescent => "DROGUE",
            FlightPhase::MainDescent => "MAIN",
            FlightPhase::Abort => "ABORT",
        }
    }

    /// Next phase of a nominal flight, if any.
    const fn successor(self) -> Option<Self> {
        match self {
            FlightPhase::Burn => Some(FlightPhase::Coast),
            FlightPhase::Coast => Some(FlightPhase::DrogueDescent),
            FlightPhase::DrogueDescent => Some(FlightPhase::MainDescent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValveAction {
    OpenInjection,
    CloseInjection,
}

/// What the flight-phase task must act on after feeding the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    Transition { from: FlightPhase, to: FlightPhase },
    Valve(ValveAction),
}

/// Task-specific codes used when phase events travel as commands.
pub mod event_code {
    pub const TRANSITION: u16 = 0x0100;
    pub const OPEN_INJECTION_VALVE: u16 = 0x0200;
    pub const CLOSE_INJECTION_VALVE: u16 = 0x0201;
}

impl PhaseEvent {
    pub const fn code(&self) -> u16 {
        match self {
            PhaseEvent::Transition { .. } => event_code::TRANSITION,
            PhaseEvent::Valve(ValveAction::OpenInjection) => event_code::OPEN_INJECTION_VALVE,
            PhaseEvent::Valve(ValveAction::CloseInjection) => event_code::CLOSE_INJECTION_VALVE,
        }
    }
}

pub struct PhaseMachine {
    phase: FlightPhase,
    last_heartbeat: Option<Instant>,
}

impl PhaseMachine {
    pub const fn new() -> Self {
        Self {
            phase: FlightPhase::Prelaunch,
            last_heartbeat: None,
        }
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// Apply one dequeued ground command.
    pub fn apply(&mut self, command: GroundCommand, now: Instant) -> Option<PhaseEvent> {
        use FlightPhase::*;

        match (command, self.phase) {
            (GroundCommand::Heartbeat, _) => {
                self.last_heartbeat = Some(now);
                None
            }
            (GroundCommand::Abort, Abort) => None,
            (GroundCommand::Abort, _) => self.transition(Abort),
            (GroundCommand::Arm, Prelaunch) => {
                // Arming starts the link watchdog from this moment.
                self.last_heartbeat = Some(now);
                self.transition(Armed)
            }
            (GroundCommand::Launch, Armed) => self.transition(Burn),
            (GroundCommand::ResetAvionics, Armed | Abort) => self.transition(Prelaunch),
            (GroundCommand::OpenInjectionValve, Abort) => {
                Some(PhaseEvent::Valve(ValveAction::OpenInjection))
            }
            (GroundCommand::CloseInjectionValve, Abort) => {
                Some(PhaseEvent::Valve(ValveAction::CloseInjection))
            }
            (cmd, phase) => {
                debug!("ignoring {:?} in {:?}", cmd, phase);
                None
            }
        }
    }

    /// Abort an armed vehicle whose ground link has gone quiet.
    pub fn check_heartbeat(&mut self, now: Instant) -> Option<PhaseEvent> {
        if self.phase != FlightPhase::Armed {
            return None;
        }
        let last = self.last_heartbeat?;
        if now.saturating_duration_since(last) > HEARTBEAT_TIMEOUT {
            warn!("ground heartbeat lost, aborting");
            return self.transition(FlightPhase::Abort);
        }
        None
    }

    /// Sensor-detected progress along Burn -> Coast -> Drogue -> Main.
    /// Anything other than the immediate successor is refused.
    pub fn enter(&mut self, next: FlightPhase) -> Option<PhaseEvent> {
        if self.phase.successor() == Some(next) {
            self.transition(next)
        } else {
            None
        }
    }

    fn transition(&mut self, to: FlightPhase) -> Option<PhaseEvent> {
        let from = self.phase;
        self.phase = to;
        info!("flight phase {:?} -> {:?}", from, to);
        Some(PhaseEvent::Transition { from, to })
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
