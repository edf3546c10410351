use core::cell::{RefCell, UnsafeCell};
use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::CommandError;
use crate::config::{PAYLOAD_SLOTS, PAYLOAD_SLOT_SIZE};

/// Reported to the pool's fault hook when the live-payload ceiling is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoolFault {
    pub live: u16,
    pub ceiling: u16,
}

pub type FaultHook = fn(PoolFault);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    /// Held by exactly one `PoolBuf`.
    Owned,
    /// Parked inside a `CommandFrame` travelling through a queue.
    InFlight,
}

struct PoolState {
    slots: [SlotState; PAYLOAD_SLOTS],
    live: u16,
    peak: u16,
    faults: u16,
}

/// Fixed-slot allocator backing command payloads.
///
/// The pool is the only place the live-allocation count is kept; commands
/// borrow it rather than touching a global. Every successful `allocate` is
/// matched by exactly one release, performed when the returned [`PoolBuf`]
/// is dropped.
pub struct PayloadPool {
    storage: UnsafeCell<[[u8; PAYLOAD_SLOT_SIZE]; PAYLOAD_SLOTS]>,
    state: Mutex<CriticalSectionRawMutex, RefCell<PoolState>>,
    ceiling: u16,
    on_fault: FaultHook,
}

// Slot bytes are only reachable through the unique `PoolBuf` that owns the
// slot; slot bookkeeping is behind the critical-section mutex.
unsafe impl Sync for PayloadPool {}

fn ignore_fault(_: PoolFault) {}

impl PayloadPool {
    pub const fn new(ceiling: u16, on_fault: FaultHook) -> Self {
        Self {
            storage: UnsafeCell::new([[0; PAYLOAD_SLOT_SIZE]; PAYLOAD_SLOTS]),
            state: Mutex::new(RefCell::new(PoolState {
                slots: [SlotState::Free; PAYLOAD_SLOTS],
                live: 0,
                peak: 0,
                faults: 0,
            })),
            ceiling,
            on_fault,
        }
    }

    /// Pool whose ceiling faults are only counted.
    pub const fn without_hook(ceiling: u16) -> Self {
        Self::new(ceiling, ignore_fault)
    }

    /// Reserve a zeroed slot for `len` bytes.
    pub fn allocate(&self, len: usize) -> Result<PoolBuf<'_>, CommandError> {
        if len > PAYLOAD_SLOT_SIZE {
            return Err(CommandError::TooLarge);
        }

        let claimed = self.state.lock(|cell| {
            let state = &mut *cell.borrow_mut();
            if state.live >= self.ceiling {
                state.faults = state.faults.wrapping_add(1);
                return Err(CommandError::CeilingReached);
            }
            let slot = state
                .slots
                .iter()
                .position(|s| *s == SlotState::Free)
                .ok_or(CommandError::PoolExhausted)?;
            state.slots[slot] = SlotState::Owned;
            state.live += 1;
            state.peak = state.peak.max(state.live);
            Ok(slot as u8)
        });

        match claimed {
            Ok(slot) => {
                let mut buf = PoolBuf {
                    pool: self,
                    slot,
                    len: len as u16,
                };
                buf.as_mut_slice().fill(0);
                Ok(buf)
            }
            Err(CommandError::CeilingReached) => {
                let fault = PoolFault {
                    live: self.live(),
                    ceiling: self.ceiling,
                };
                error!("payload ceiling reached: {} live of {}", fault.live, fault.ceiling);
                (self.on_fault)(fault);
                Err(CommandError::CeilingReached)
            }
            Err(e) => Err(e),
        }
    }

    /// Payloads currently allocated, in flight or owned.
    pub fn live(&self) -> u16 {
        self.state.lock(|s| s.borrow().live)
    }

    /// Highest `live` value observed since start.
    pub fn peak(&self) -> u16 {
        self.state.lock(|s| s.borrow().peak)
    }

    pub fn faults(&self) -> u16 {
        self.state.lock(|s| s.borrow().faults)
    }

    pub const fn ceiling(&self) -> u16 {
        self.ceiling
    }

    /// Owned -> InFlight. Called when a command is flattened into a frame.
    pub(super) fn park(&self, slot: u8) {
        self.state.lock(|cell| {
            if let Some(state) = cell.borrow_mut().slots.get_mut(slot as usize) {
                *state = SlotState::InFlight;
            }
        });
    }

    /// InFlight -> Owned. Fails if the frame was already turned back into a
    /// command, so two copies of one frame can never both own the bytes.
    pub(super) fn reclaim(&self, slot: u8, len: u16) -> Result<PoolBuf<'_>, CommandError> {
        if len as usize > PAYLOAD_SLOT_SIZE {
            return Err(CommandError::StaleFrame);
        }
        self.state.lock(|cell| match cell.borrow_mut().slots.get_mut(slot as usize) {
            Some(state) if *state == SlotState::InFlight => {
                *state = SlotState::Owned;
                Ok(())
            }
            _ => Err(CommandError::StaleFrame),
        })?;
        Ok(PoolBuf {
            pool: self,
            slot,
            len,
        })
    }

    fn release(&self, slot: u8) {
        self.state.lock(|cell| {
            let state = &mut *cell.borrow_mut();
            if let Some(entry) = state.slots.get_mut(slot as usize) {
                if *entry != SlotState::Free {
                    *entry = SlotState::Free;
                    state.live -= 1;
                }
            }
        });
    }

    fn slot_ptr(&self, slot: u8) -> *mut [u8; PAYLOAD_SLOT_SIZE] {
        // In bounds: slots are only created from `position` over the slot table.
        unsafe {
            self.storage
                .get()
                .cast::<[u8; PAYLOAD_SLOT_SIZE]>()
                .add(slot as usize)
        }
    }
}

/// Move-only handle to one pool slot. Dropping it frees the slot.
pub struct PoolBuf<'p> {
    pool: &'p PayloadPool,
    slot: u8,
    len: u16,
}

impl<'p> PoolBuf<'p> {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pool the slot belongs to.
    pub fn pool(&self) -> &'p PayloadPool {
        self.pool
    }

    pub fn as_slice(&self) -> &[u8] {
        let bytes = unsafe { &*self.pool.slot_ptr(self.slot) };
        &bytes[..self.len as usize]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let bytes = unsafe { &mut *self.pool.slot_ptr(self.slot) };
        &mut bytes[..self.len as usize]
    }

    /// Hand the slot over to a frame without freeing it.
    pub(super) fn park(self) -> (u8, u16) {
        let this = core::mem::ManuallyDrop::new(self);
        this.pool.park(this.slot);
        (this.slot, this.len)
    }
}

impl Drop for PoolBuf<'_> {
    fn drop(&mut self) {
        self.pool.release(self.slot);
    }
}

impl fmt::Debug for PoolBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuf")
            .field("slot", &self.slot)
            .field("len", &self.len)
            .finish()
    }
}
