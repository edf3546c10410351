use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::with_timeout;
use heapless::Deque;

use crate::wait::Wait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    Full,
    Empty,
    Timeout,
}

struct Inner<const N: usize> {
    entries: Deque<u8, N>,
    receiver: WakerRegistration,
}

/// Bounded byte queue between the ground-link receiver and the flight-phase
/// task. Producers may insert at either end without ever blocking; the
/// consumer always takes from the front.
pub struct FlightPhaseQueue<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<N>>>,
}

impl<const N: usize> FlightPhaseQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                entries: Deque::new(),
                receiver: WakerRegistration::new(),
            })),
        }
    }

    /// Append behind everything pending. Interrupt safe.
    pub fn try_push_back(&self, byte: u8) -> Result<(), QueueError> {
        self.push(byte, false)
    }

    /// Jump ahead of everything pending. Interrupt safe.
    pub fn try_push_front(&self, byte: u8) -> Result<(), QueueError> {
        self.push(byte, true)
    }

    fn push(&self, byte: u8, front: bool) -> Result<(), QueueError> {
        self.inner.lock(|cell| {
            let inner = &mut *cell.borrow_mut();
            let pushed = if front {
                inner.entries.push_front(byte)
            } else {
                inner.entries.push_back(byte)
            };
            pushed.map_err(|_| QueueError::Full)?;
            inner.receiver.wake();
            Ok(())
        })
    }

    pub fn try_receive(&self) -> Result<u8, QueueError> {
        self.inner
            .lock(|cell| cell.borrow_mut().entries.pop_front())
            .ok_or(QueueError::Empty)
    }

    /// Wait until a byte is available.
    pub async fn receive(&self) -> u8 {
        poll_fn(|cx| {
            self.inner.lock(|cell| {
                let inner = &mut *cell.borrow_mut();
                match inner.entries.pop_front() {
                    Some(byte) => Poll::Ready(byte),
                    None => {
                        inner.receiver.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }

    pub async fn receive_within(&self, wait: Wait) -> Result<u8, QueueError> {
        match wait {
            Wait::Poll => self.try_receive(),
            Wait::For(d) => with_timeout(d, self.receive())
                .await
                .map_err(|_| QueueError::Timeout),
            Wait::Forever => Ok(self.receive().await),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().entries.is_full())
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Pending bytes, front first. For diagnostics and tests.
    pub fn pending(&self) -> heapless::Vec<u8, N> {
        self.inner
            .lock(|cell| cell.borrow().entries.iter().copied().collect())
    }
}

impl<const N: usize> Default for FlightPhaseQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
