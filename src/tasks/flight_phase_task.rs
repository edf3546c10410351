use avionics_core::command::{Command, CommandError, CommandQueue};
use avionics_core::config::{EVENT_QUEUE_SIZE, FLIGHT_PHASE_POLL, FLIGHT_PHASE_QUEUE_SIZE};
use avionics_core::phase::PhaseEvent;
use avionics_core::record::SharedRecord;
use avionics_core::{FlightPhase, FlightPhaseQueue, GroundCommand, PhaseMachine, Wait};
use embassy_executor::task;
use embassy_time::Instant;

/// Flight-phase task: sole consumer of the ground command queue.
///
/// Wakes on every queued byte, or after `FLIGHT_PHASE_POLL` to run the
/// heartbeat watchdog. Each resulting event is published and forwarded as a
/// command so telemetry can report it.
#[task]
pub async fn flight_phase_task(
    queue: &'static FlightPhaseQueue<FLIGHT_PHASE_QUEUE_SIZE>,
    phase: &'static SharedRecord<FlightPhase>,
    events: &'static CommandQueue<'static, EVENT_QUEUE_SIZE>,
) {
    let mut machine = PhaseMachine::new();

    loop {
        let event = match queue.receive_within(Wait::For(FLIGHT_PHASE_POLL)).await {
            Ok(byte) => machine.apply(GroundCommand::from_byte(byte), Instant::now()),
            Err(_) => None,
        };
        let watchdog = machine.check_heartbeat(Instant::now());

        for event in [event, watchdog].into_iter().flatten() {
            if let PhaseEvent::Transition { to, .. } = event {
                // The phase must reach the record even if telemetry is slow.
                if phase.publish(to, Wait::Forever).await.is_err() {
                    defmt::error!("phase record unavailable");
                }
            }

            match event_command(events, event) {
                // A rejected command comes back and frees its payload on drop.
                Ok(command) => {
                    if events.try_send(command).is_err() {
                        defmt::warn!("event queue full, dropping {}", event);
                    }
                }
                Err(e) => defmt::warn!("event {} not forwarded: {}", event, e),
            }
        }
    }
}

/// Task-specific command carrying `[from, to]` for transitions, no payload
/// for valve actions.
fn event_command(
    events: &'static CommandQueue<'static, EVENT_QUEUE_SIZE>,
    event: PhaseEvent,
) -> Result<Command<'static>, CommandError> {
    let mut command = Command::task(event.code());
    if let PhaseEvent::Transition { from, to } = event {
        let data = command.allocate_data(events.pool(), 2)?;
        data[0] = from.index();
        data[1] = to.index();
    }
    Ok(command)
}
