use embassy_futures::block_on;

use super::*;
use crate::config::{ABORT_CMD_BYTE, ARM_CMD_BYTE, FLIGHT_PHASE_QUEUE_SIZE, HEARTBEAT_BYTE, LAUNCH_CMD_BYTE};
use crate::wait::Wait;

#[test]
fn test_classify_bytes() {
    assert_eq!(GroundCommand::from_byte(ABORT_CMD_BYTE), GroundCommand::Abort);
    assert_eq!(GroundCommand::from_byte(ARM_CMD_BYTE), GroundCommand::Arm);
    assert_eq!(GroundCommand::from(LAUNCH_CMD_BYTE), GroundCommand::Launch);
    assert_eq!(GroundCommand::from_byte(0xEE), GroundCommand::Unknown(0xEE));

    for byte in 0..=u8::MAX {
        let cmd = GroundCommand::from_byte(byte);
        assert_eq!(cmd.to_byte(), byte);
        assert_eq!(cmd.is_abort_class(), byte == ABORT_CMD_BYTE);
    }
}

#[test]
fn test_abort_jumps_queue() {
    let queue: FlightPhaseQueue<FLIGHT_PHASE_QUEUE_SIZE> = FlightPhaseQueue::new();
    let router = GroundLinkRouter::new(&queue);

    assert_eq!(router.route(ARM_CMD_BYTE), Ok(Placement::Back));
    assert_eq!(router.route(HEARTBEAT_BYTE), Ok(Placement::Back));
    assert_eq!(router.route(ABORT_CMD_BYTE), Ok(Placement::Front));
    assert_eq!(router.route(LAUNCH_CMD_BYTE), Ok(Placement::Back));

    assert_eq!(
        queue.pending().as_slice(),
        &[ABORT_CMD_BYTE, ARM_CMD_BYTE, HEARTBEAT_BYTE, LAUNCH_CMD_BYTE]
    );
    assert_eq!(
        router.stats(),
        RouterStats {
            front: 1,
            back: 3,
            dropped: 0
        }
    );
}

#[test]
fn test_full_queue_drops_without_reordering() {
    let queue: FlightPhaseQueue<3> = FlightPhaseQueue::new();
    let router = GroundLinkRouter::new(&queue);
    router.route(0x61).unwrap();
    router.route(0x62).unwrap();
    router.route(0x63).unwrap();
    assert!(queue.is_full());

    assert_eq!(
        router.route(ABORT_CMD_BYTE),
        Err(RouteError::QueueFull(GroundCommand::Abort))
    );
    assert_eq!(
        router.route(0x64),
        Err(RouteError::QueueFull(GroundCommand::Unknown(0x64)))
    );
    assert_eq!(queue.pending().as_slice(), &[0x61, 0x62, 0x63]);
    assert_eq!(router.stats().dropped, 2);

    assert_eq!(queue.try_push_front(0x01), Err(QueueError::Full));
    assert_eq!(queue.len(), 3);
}

/// Every interleaving of normal pushes, abort pushes and pops: an abort is
/// always dequeued before every normal byte that was pending when it arrived,
/// and normal bytes keep arrival order.
#[test]
fn test_priority_holds_for_all_interleavings() {
    const STEPS: u32 = 7;

    for case in 0..3u32.pow(STEPS) {
        let queue: FlightPhaseQueue<FLIGHT_PHASE_QUEUE_SIZE> = FlightPhaseQueue::new();
        let router = GroundLinkRouter::new(&queue);

        // Per normal byte: (aborts dequeued when it was pushed, aborts pushed while pending)
        let mut normals: [(u32, u32); STEPS as usize] = [(0, 0); STEPS as usize];
        let mut pending_normals: heapless::Vec<u8, 8> = heapless::Vec::new();
        let mut next_normal = 0u8;
        let mut aborts_out = 0u32;
        let mut last_normal_out: Option<u8> = None;

        let mut check_pop = |byte: u8,
                             normals: &mut [(u32, u32)],
                             pending: &mut heapless::Vec<u8, 8>,
                             aborts_out: &mut u32| {
            if byte == ABORT_CMD_BYTE {
                *aborts_out += 1;
                return;
            }
            let k = byte - 0x60;
            let (at_push, inserted) = normals[k as usize];
            assert!(
                *aborts_out - at_push >= inserted,
                "case {}: normal {} overtook an abort",
                case,
                k
            );
            if let Some(prev) = last_normal_out {
                assert!(prev < k, "case {}: normals out of order", case);
            }
            last_normal_out = Some(k);
            pending.retain(|&p| p != k);
        };

        let mut c = case;
        for _ in 0..STEPS {
            match c % 3 {
                0 => {
                    router.route(0x60 + next_normal).unwrap();
                    normals[next_normal as usize] = (aborts_out, 0);
                    pending_normals.push(next_normal).unwrap();
                    next_normal += 1;
                }
                1 => {
                    router.route(ABORT_CMD_BYTE).unwrap();
                    for &p in pending_normals.iter() {
                        normals[p as usize].1 += 1;
                    }
                }
                _ => {
                    if let Ok(byte) = queue.try_receive() {
                        check_pop(byte, &mut normals, &mut pending_normals, &mut aborts_out);
                    }
                }
            }
            c /= 3;
        }
        while let Ok(byte) = queue.try_receive() {
            check_pop(byte, &mut normals, &mut pending_normals, &mut aborts_out);
        }
        assert!(pending_normals.is_empty());
        assert_eq!(router.stats().dropped, 0);
    }
}

#[test]
fn test_receive_waits_for_byte() {
    let queue: FlightPhaseQueue<4> = FlightPhaseQueue::new();
    assert_eq!(block_on(queue.receive_within(Wait::Poll)), Err(QueueError::Empty));
    assert_eq!(
        block_on(queue.receive_within(Wait::millis(5))),
        Err(QueueError::Timeout)
    );

    queue.try_push_back(HEARTBEAT_BYTE).unwrap();
    assert_eq!(block_on(queue.receive_within(Wait::Forever)), Ok(HEARTBEAT_BYTE));
    assert!(queue.is_empty());
    assert_eq!(queue.capacity(), 4);
}
