use core::sync::atomic::{AtomicU32, Ordering};

use super::{FlightPhaseQueue, GroundCommand};

/// Where a routed byte ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Placement {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    /// Queue full; the byte was dropped and counted.
    QueueFull(GroundCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouterStats {
    pub front: u32,
    pub back: u32,
    pub dropped: u32,
}

/// Receive-side half of the ground link.
///
/// `route` runs in the UART receive path: it classifies one byte and
/// inserts it without blocking, abort-class bytes at the front. A full
/// queue drops the byte and bumps a counter; it is never retried here.
pub struct GroundLinkRouter<'q, const N: usize> {
    queue: &'q FlightPhaseQueue<N>,
    front: AtomicU32,
    back: AtomicU32,
    dropped: AtomicU32,
}

impl<'q, const N: usize> GroundLinkRouter<'q, N> {
    pub const fn new(queue: &'q FlightPhaseQueue<N>) -> Self {
        Self {
            queue,
            front: AtomicU32::new(0),
            back: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    pub fn route(&self, byte: u8) -> Result<Placement, RouteError> {
        let command = GroundCommand::from_byte(byte);
        let (res, placement, counter) = if command.is_abort_class() {
            (self.queue.try_push_front(byte), Placement::Front, &self.front)
        } else {
            (self.queue.try_push_back(byte), Placement::Back, &self.back)
        };

        match res {
            Ok(()) => {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(placement)
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("flight queue full, dropped {:?} ({:?})", command, placement);
                Err(RouteError::QueueFull(command))
            }
        }
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            front: self.front.load(Ordering::Relaxed),
            back: self.back.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn queue(&self) -> &'q FlightPhaseQueue<N> {
        self.queue
    }
}
