use core::sync::atomic::{AtomicU16, Ordering};

use embassy_futures::block_on;

use super::*;
use crate::config::PAYLOAD_SLOT_SIZE;
use crate::wait::Wait;

#[test]
fn test_default_command_is_empty() {
    let cmd = Command::new();
    assert_eq!(cmd.global_command(), GlobalCommand::None);
    assert_eq!(cmd.task_command(), 0);
    assert!(!cmd.has_data());
    assert_eq!(cmd.data_len(), 0);
}

#[test]
fn test_task_command_sets_task_specific() {
    let cmd = Command::task(0x1234);
    assert_eq!(cmd.global_command(), GlobalCommand::TaskSpecific);
    assert_eq!(cmd.task_command(), 0x1234);

    let cmd = Command::global(GlobalCommand::TaskSpecific);
    assert_eq!(cmd.task_command(), 0);
}

#[test]
fn test_allocate_then_reset_balances_counter() {
    let pool = PayloadPool::without_hook(4);
    let mut cmd = Command::task(1);

    let data = cmd.allocate_data(&pool, 8).unwrap();
    data.copy_from_slice(b"abcdefgh");
    assert_eq!(pool.live(), 1);
    assert!(cmd.owns_data());
    assert_eq!(cmd.data(), b"abcdefgh");

    cmd.reset();
    assert_eq!(pool.live(), 0);
    assert!(!cmd.has_data());

    // A second reset has nothing left to free.
    cmd.reset();
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_allocate_twice_requires_reset() {
    let pool = PayloadPool::without_hook(4);
    let mut cmd = Command::task(1);
    cmd.allocate_data(&pool, 4).unwrap();
    assert_eq!(
        cmd.allocate_data(&pool, 4).unwrap_err(),
        CommandError::PayloadPresent
    );
    assert_eq!(pool.live(), 1);

    cmd.reset();
    cmd.allocate_data(&pool, 4).unwrap();
    assert_eq!(pool.live(), 1);
}

#[test]
fn test_allocate_too_large() {
    let pool = PayloadPool::without_hook(4);
    let mut cmd = Command::new();
    assert_eq!(
        cmd.allocate_data(&pool, PAYLOAD_SLOT_SIZE + 1).unwrap_err(),
        CommandError::TooLarge
    );
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_drop_without_reset_frees_payload() {
    let pool = PayloadPool::without_hook(4);
    {
        let mut cmd = Command::task(3);
        cmd.allocate_data(&pool, 2).unwrap();
        assert_eq!(pool.live(), 1);
    }
    assert_eq!(pool.live(), 0);
    assert_eq!(pool.peak(), 1);
}

static FAULTS_SEEN: AtomicU16 = AtomicU16::new(0);

fn count_fault(fault: PoolFault) {
    assert_eq!(fault.ceiling, 2);
    FAULTS_SEEN.fetch_add(1, Ordering::Relaxed);
}

#[test]
fn test_ceiling_breach_reports_fault() {
    let pool = PayloadPool::new(2, count_fault);
    let mut a = Command::new();
    let mut b = Command::new();
    let mut c = Command::new();
    a.allocate_data(&pool, 1).unwrap();
    b.allocate_data(&pool, 1).unwrap();

    assert_eq!(
        c.allocate_data(&pool, 1).unwrap_err(),
        CommandError::CeilingReached
    );
    assert_eq!(pool.faults(), 1);
    assert_eq!(FAULTS_SEEN.load(Ordering::Relaxed), 1);
    assert_eq!(pool.live(), 2);
    assert!(!c.has_data());

    a.reset();
    c.allocate_data(&pool, 1).unwrap();
    assert_eq!(pool.live(), 2);
}

#[test]
fn test_borrowed_data_is_never_freed() {
    static TABLE: [u8; 3] = [7, 8, 9];
    let pool = PayloadPool::without_hook(4);
    let mut cmd: Command<'_> = Command::task(2);
    cmd.set_borrowed_data(&TABLE).unwrap();
    assert!(!cmd.owns_data());
    assert_eq!(cmd.data(), &[7, 8, 9]);

    let frame = cmd.into_frame();
    assert!(!frame.owns_data());
    let mut back = Command::from_frame(frame, &pool).unwrap();
    assert_eq!(back.data(), &[7, 8, 9]);
    back.reset();
    assert_eq!(pool.live(), 0);
    assert_eq!(TABLE, [7, 8, 9]);
}

#[test]
fn test_set_owned_data_rejects_second_payload() {
    let pool = PayloadPool::without_hook(4);
    let mut cmd = Command::task(5);
    cmd.set_owned_data(pool.allocate(3).unwrap()).unwrap();
    assert_eq!(pool.live(), 1);

    let extra = pool.allocate(3).unwrap();
    assert_eq!(pool.live(), 2);
    assert_eq!(
        cmd.set_owned_data(extra).unwrap_err(),
        CommandError::PayloadPresent
    );
    // The rejected buffer went back to the pool.
    assert_eq!(pool.live(), 1);
}

#[test]
fn test_frame_copy_reclaims_once() {
    let pool = PayloadPool::without_hook(4);
    let mut cmd = Command::task(9);
    cmd.allocate_data(&pool, 2).unwrap().copy_from_slice(&[0xAA, 0x55]);

    let frame = cmd.into_frame();
    let copy = frame;
    assert_eq!(frame.data_len(), 2);
    assert_eq!(pool.live(), 1);

    let mut first = Command::from_frame(frame, &pool).unwrap();
    assert_eq!(first.data(), &[0xAA, 0x55]);
    assert_eq!(
        Command::from_frame(copy, &pool).unwrap_err(),
        CommandError::StaleFrame
    );

    first.reset();
    assert_eq!(pool.live(), 0);
    // The slot is free now, so the stale copy still cannot claim it.
    assert_eq!(
        Command::from_frame(copy, &pool).unwrap_err(),
        CommandError::StaleFrame
    );
}

#[test]
fn test_queue_moves_payload_ownership() {
    let pool = PayloadPool::without_hook(4);
    let queue: CommandQueue<'_, 2> = CommandQueue::new(&pool);

    let mut cmd = Command::task(0x10);
    cmd.allocate_data(&pool, 3).unwrap().copy_from_slice(b"xyz");
    queue.try_send(cmd).unwrap();
    assert_eq!(pool.live(), 1);

    let mut got = queue.try_receive().unwrap();
    assert_eq!(got.task_command(), 0x10);
    assert_eq!(got.data(), b"xyz");
    got.reset();
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_queue_full_returns_command() {
    let pool = PayloadPool::without_hook(4);
    let queue: CommandQueue<'_, 1> = CommandQueue::new(&pool);
    queue.try_send(Command::task(1)).unwrap();

    let mut second = Command::task(2);
    second.allocate_data(&pool, 1).unwrap()[0] = 42;
    let bounced = queue.try_send(second).unwrap_err();
    assert_eq!(bounced.task_command(), 2);
    assert_eq!(bounced.data(), &[42]);
    assert!(queue.is_full());
    assert_eq!(pool.live(), 1);

    drop(bounced);
    assert_eq!(pool.live(), 0);
    assert_eq!(queue.try_receive().unwrap().task_command(), 1);
}

#[test]
fn test_queue_receive_waits() {
    let pool = PayloadPool::without_hook(4);
    let queue: CommandQueue<'_, 2> = CommandQueue::new(&pool);

    assert_eq!(
        block_on(queue.receive(Wait::Poll)).unwrap_err(),
        CommandError::QueueEmpty
    );
    assert_eq!(
        block_on(queue.receive(Wait::millis(5))).unwrap_err(),
        CommandError::Timeout
    );

    block_on(queue.send(Command::task(77))).unwrap();
    let got = block_on(queue.receive(Wait::Forever)).unwrap();
    assert_eq!(got.task_command(), 77);
    assert!(queue.is_empty());
}

#[test]
fn test_queue_refuses_payload_from_other_pool() {
    let pool = PayloadPool::without_hook(4);
    let other = PayloadPool::without_hook(4);
    let queue: CommandQueue<'_, 4> = CommandQueue::new(&pool);

    let mut ours = Command::task(1);
    ours.allocate_data(&pool, 2).unwrap().copy_from_slice(b"AA");
    let mut foreign = Command::task(2);
    foreign.allocate_data(&other, 2).unwrap().copy_from_slice(b"BB");
    assert!(ours.payload_from(&pool));
    assert!(!foreign.payload_from(&pool));

    // Foreign first: it must not land on the slot index `ours` is about to use.
    let bounced = queue.try_send(foreign).unwrap_err();
    assert_eq!(bounced.task_command(), 2);
    assert_eq!(bounced.data(), b"BB");
    queue.try_send(ours).unwrap();
    assert_eq!(queue.len(), 1);

    let bounced = block_on(queue.send(bounced)).unwrap_err();
    assert_eq!(bounced.data(), b"BB");
    drop(bounced);
    assert_eq!(other.live(), 0);

    let mut got = queue.try_receive().unwrap();
    assert_eq!(got.task_command(), 1);
    assert_eq!(got.data(), b"AA");
    got.reset();
    assert_eq!(pool.live(), 0);
    assert_eq!(queue.try_receive().unwrap_err(), CommandError::QueueEmpty);
}

#[test]
fn test_queue_accepts_borrowed_and_empty_payloads() {
    static BYTES: [u8; 2] = [1, 2];
    let pool = PayloadPool::without_hook(4);
    let queue: CommandQueue<'_, 2> = CommandQueue::new(&pool);

    let mut borrowed = Command::task(3);
    borrowed.set_borrowed_data(&BYTES).unwrap();
    queue.try_send(borrowed).unwrap();
    queue.try_send(Command::global(GlobalCommand::None)).unwrap();

    assert_eq!(queue.try_receive().unwrap().data(), &[1, 2]);
    assert!(!queue.try_receive().unwrap().has_data());
    assert_eq!(pool.live(), 0);
}
