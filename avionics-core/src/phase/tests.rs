use embassy_time::{Duration, Instant};

use super::*;

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

#[test]
fn test_nominal_ground_sequence() {
    let mut sm = PhaseMachine::new();
    assert_eq!(sm.phase(), FlightPhase::Prelaunch);

    assert_eq!(
        sm.apply(GroundCommand::Arm, at(0)),
        Some(PhaseEvent::Transition {
            from: FlightPhase::Prelaunch,
            to: FlightPhase::Armed
        })
    );
    assert_eq!(
        sm.apply(GroundCommand::Launch, at(10)),
        Some(PhaseEvent::Transition {
            from: FlightPhase::Armed,
            to: FlightPhase::Burn
        })
    );
    assert_eq!(sm.phase(), FlightPhase::Burn);
}

#[test]
fn test_launch_requires_arm() {
    let mut sm = PhaseMachine::new();
    assert_eq!(sm.apply(GroundCommand::Launch, at(0)), None);
    assert_eq!(sm.phase(), FlightPhase::Prelaunch);
}

#[test]
fn test_abort_from_any_phase_once() {
    let mut sm = PhaseMachine::new();
    sm.apply(GroundCommand::Arm, at(0));
    sm.apply(GroundCommand::Launch, at(1));
    assert!(matches!(
        sm.apply(GroundCommand::Abort, at(2)),
        Some(PhaseEvent::Transition {
            to: FlightPhase::Abort,
            ..
        })
    ));
    assert_eq!(sm.apply(GroundCommand::Abort, at(3)), None);
}

#[test]
fn test_valves_only_in_abort() {
    let mut sm = PhaseMachine::new();
    assert_eq!(sm.apply(GroundCommand::OpenInjectionValve, at(0)), None);

    sm.apply(GroundCommand::Abort, at(1));
    assert_eq!(
        sm.apply(GroundCommand::OpenInjectionValve, at(2)),
        Some(PhaseEvent::Valve(ValveAction::OpenInjection))
    );
    assert_eq!(
        sm.apply(GroundCommand::CloseInjectionValve, at(3)),
        Some(PhaseEvent::Valve(ValveAction::CloseInjection))
    );
    assert_eq!(sm.phase(), FlightPhase::Abort);
}

#[test]
fn test_reset_returns_to_prelaunch() {
    let mut sm = PhaseMachine::new();
    sm.apply(GroundCommand::Abort, at(0));
    sm.apply(GroundCommand::ResetAvionics, at(1));
    assert_eq!(sm.phase(), FlightPhase::Prelaunch);

    // Never mid-flight.
    sm.apply(GroundCommand::Arm, at(2));
    sm.apply(GroundCommand::Launch, at(3));
    assert_eq!(sm.apply(GroundCommand::ResetAvionics, at(4)), None);
    assert_eq!(sm.phase(), FlightPhase::Burn);
}

#[test]
fn test_heartbeat_loss_aborts_armed_vehicle() {
    let mut sm = PhaseMachine::new();
    sm.apply(GroundCommand::Arm, at(0));

    let ms = HEARTBEAT_TIMEOUT.as_millis();
    sm.apply(GroundCommand::Heartbeat, at(ms / 2));
    assert_eq!(sm.check_heartbeat(at(ms)), None);
    assert_eq!(sm.phase(), FlightPhase::Armed);

    let late = at(ms / 2) + HEARTBEAT_TIMEOUT + Duration::from_millis(1);
    assert!(sm.check_heartbeat(late).is_some());
    assert_eq!(sm.phase(), FlightPhase::Abort);
}

#[test]
fn test_heartbeat_ignored_outside_armed() {
    let mut sm = PhaseMachine::new();
    assert_eq!(sm.check_heartbeat(at(1_000_000)), None);
    assert_eq!(sm.phase(), FlightPhase::Prelaunch);
}

#[test]
fn test_enter_only_accepts_successor() {
    let mut sm = PhaseMachine::new();
    assert_eq!(sm.enter(FlightPhase::Coast), None);

    sm.apply(GroundCommand::Arm, at(0));
    sm.apply(GroundCommand::Launch, at(1));
    assert_eq!(sm.enter(FlightPhase::MainDescent), None);
    assert!(sm.enter(FlightPhase::Coast).is_some());
    assert!(sm.enter(FlightPhase::DrogueDescent).is_some());
    assert!(sm.enter(FlightPhase::MainDescent).is_some());
    assert_eq!(sm.enter(FlightPhase::MainDescent), None);
}

#[test]
fn test_phase_codes() {
    assert_eq!(FlightPhase::Prelaunch.blink_count(), 1);
    assert_eq!(FlightPhase::MainDescent.blink_count(), 6);
    for raw in 0..7 {
        assert_eq!(FlightPhase::from_u8(raw).unwrap().index(), raw);
    }
    assert!(FlightPhase::from_u8(7).is_none());
}
