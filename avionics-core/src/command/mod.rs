//! Commands exchanged between interrupt handlers and tasks.
//!
//! A [`Command`] owns its payload: moving it moves the payload, resetting
//! or dropping it frees the payload exactly once. Queues carry the `Copy`
//! [`CommandFrame`] view instead, and the receiving side turns the frame
//! back into an owning `Command` with [`Command::from_frame`].

mod pool;
mod queue;

pub use pool::{FaultHook, PayloadPool, PoolBuf, PoolFault};
pub use queue::CommandQueue;

// ── Codes ─────────────────────────────────────────────────────────────────────

/// Command code every task understands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GlobalCommand {
    /// Nothing to do; the command can be ignored.
    #[default]
    None = 0,
    /// Look at `task_command` for the receiver-specific meaning.
    TaskSpecific = 1,
}

impl GlobalCommand {
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(GlobalCommand::None),
            1 => Some(GlobalCommand::TaskSpecific),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// A payload is already attached; `reset` first.
    PayloadPresent,
    /// Requested payload is larger than a pool slot.
    TooLarge,
    /// Every pool slot is in use.
    PoolExhausted,
    /// The live-payload ceiling was hit; the pool fault hook has fired.
    CeilingReached,
    /// The frame's payload was already reclaimed by another copy.
    StaleFrame,
    QueueEmpty,
    Timeout,
}

// ── Payload ───────────────────────────────────────────────────────────────────

/// Optional data carried by a command.
#[derive(Debug, Default)]
pub enum Payload<'p> {
    #[default]
    Empty,
    /// Pool slot owned by the command; freed on reset.
    Owned(PoolBuf<'p>),
    /// Caller-owned bytes; never freed by the command.
    Borrowed(&'static [u8]),
}

impl Payload<'_> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Payload::Empty => &[],
            Payload::Owned(buf) => buf.as_slice(),
            Payload::Borrowed(bytes) => bytes,
        }
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Command<'p> {
    global: GlobalCommand,
    task_command: u16,
    payload: Payload<'p>,
}

impl<'p> Command<'p> {
    pub const fn new() -> Self {
        Self {
            global: GlobalCommand::None,
            task_command: 0,
            payload: Payload::Empty,
        }
    }

    pub const fn global(global: GlobalCommand) -> Self {
        Self {
            global,
            task_command: 0,
            payload: Payload::Empty,
        }
    }

    pub const fn task(task_command: u16) -> Self {
        Self {
            global: GlobalCommand::TaskSpecific,
            task_command,
            payload: Payload::Empty,
        }
    }

    /// Allocate `size` zeroed bytes from `pool` and return them for filling.
    pub fn allocate_data(
        &mut self,
        pool: &'p PayloadPool,
        size: usize,
    ) -> Result<&mut [u8], CommandError> {
        if !matches!(self.payload, Payload::Empty) {
            return Err(CommandError::PayloadPresent);
        }
        self.payload = Payload::Owned(pool.allocate(size)?);
        match &mut self.payload {
            Payload::Owned(buf) => Ok(buf.as_mut_slice()),
            _ => Err(CommandError::PayloadPresent),
        }
    }

    /// Attach a payload the command will free on reset.
    ///
    /// On failure `buf` is dropped, which returns its slot to the pool.
    pub fn set_owned_data(&mut self, buf: PoolBuf<'p>) -> Result<(), CommandError> {
        if !matches!(self.payload, Payload::Empty) {
            return Err(CommandError::PayloadPresent);
        }
        self.payload = Payload::Owned(buf);
        Ok(())
    }

    /// Attach bytes the command must never free.
    pub fn set_borrowed_data(&mut self, data: &'static [u8]) -> Result<(), CommandError> {
        if !matches!(self.payload, Payload::Empty) {
            return Err(CommandError::PayloadPresent);
        }
        self.payload = Payload::Borrowed(data);
        Ok(())
    }

    /// Drop the payload, freeing it if owned. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.payload = Payload::Empty;
    }

    pub fn global_command(&self) -> GlobalCommand {
        self.global
    }

    pub fn task_command(&self) -> u16 {
        self.task_command
    }

    pub fn data(&self) -> &[u8] {
        self.payload.as_slice()
    }

    pub fn data_len(&self) -> usize {
        self.data().len()
    }

    pub fn has_data(&self) -> bool {
        !matches!(self.payload, Payload::Empty)
    }

    pub fn owns_data(&self) -> bool {
        matches!(self.payload, Payload::Owned(_))
    }

    /// True unless the command owns a slot from some other pool.
    pub fn payload_from(&self, pool: &PayloadPool) -> bool {
        match &self.payload {
            Payload::Owned(buf) => core::ptr::eq(buf.pool(), pool),
            _ => true,
        }
    }

    /// Flatten into the queue wire view. An owned payload stays allocated
    /// until the frame is turned back into a command.
    pub fn into_frame(self) -> CommandFrame {
        let payload = match self.payload {
            Payload::Empty => FramePayload::None,
            Payload::Owned(buf) => {
                let (slot, len) = buf.park();
                FramePayload::Owned { slot, len }
            }
            Payload::Borrowed(bytes) => FramePayload::Borrowed(bytes),
        };
        CommandFrame {
            global: self.global,
            task_command: self.task_command,
            payload,
        }
    }

    /// Rebuild the owning command from a dequeued frame.
    pub fn from_frame(frame: CommandFrame, pool: &'p PayloadPool) -> Result<Self, CommandError> {
        let payload = match frame.payload {
            FramePayload::None => Payload::Empty,
            FramePayload::Owned { slot, len } => match pool.reclaim(slot, len) {
                Ok(buf) => Payload::Owned(buf),
                Err(e) => {
                    warn!("stale command frame for payload slot {}", slot);
                    return Err(e);
                }
            },
            FramePayload::Borrowed(bytes) => Payload::Borrowed(bytes),
        };
        Ok(Self {
            global: frame.global,
            task_command: frame.task_command,
            payload,
        })
    }
}

// ── Wire view ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePayload {
    None,
    Owned { slot: u8, len: u16 },
    Borrowed(&'static [u8]),
}

/// Plain-data form of a [`Command`] as stored in queue slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub global: GlobalCommand,
    pub task_command: u16,
    pub payload: FramePayload,
}

impl CommandFrame {
    pub fn owns_data(&self) -> bool {
        matches!(self.payload, FramePayload::Owned { .. })
    }

    pub fn data_len(&self) -> usize {
        match self.payload {
            FramePayload::None => 0,
            FramePayload::Owned { len, .. } => len as usize,
            FramePayload::Borrowed(bytes) => bytes.len(),
        }
    }
}

#[cfg(test)]
mod tests;
