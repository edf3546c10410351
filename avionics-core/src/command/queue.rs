use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::with_timeout;

use super::{Command, CommandError, CommandFrame, PayloadPool};
use crate::wait::Wait;

/// Bounded command queue bound to the pool its payloads come from.
///
/// Slots hold [`CommandFrame`]s; ownership of a pooled payload moves with
/// the command into the queue and out again on receive.
pub struct CommandQueue<'p, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, CommandFrame, N>,
    pool: &'p PayloadPool,
}

impl<'p, const N: usize> CommandQueue<'p, N> {
    pub const fn new(pool: &'p PayloadPool) -> Self {
        Self {
            channel: Channel::new(),
            pool,
        }
    }

    pub fn pool(&self) -> &'p PayloadPool {
        self.pool
    }

    /// Non-blocking send, usable from interrupt context. A full queue, or a
    /// payload owned by a different pool, hands the command back untouched.
    pub fn try_send(&self, command: Command<'p>) -> Result<(), Command<'p>> {
        let command = self.check_pool(command)?;
        match self.channel.try_send(command.into_frame()) {
            Ok(()) => Ok(()),
            // The frame never left this call, so its slot is still parked for us.
            Err(TrySendError::Full(frame)) => {
                Err(Command::from_frame(frame, self.pool).unwrap_or_default())
            }
        }
    }

    /// Wait for space, then enqueue. Only a foreign-pool payload is refused.
    pub async fn send(&self, command: Command<'p>) -> Result<(), Command<'p>> {
        let command = self.check_pool(command)?;
        self.channel.send(command.into_frame()).await;
        Ok(())
    }

    /// Frames only carry a slot index, so the receiver can reclaim the
    /// payload only from the pool this queue is bound to.
    fn check_pool(&self, command: Command<'p>) -> Result<Command<'p>, Command<'p>> {
        if command.payload_from(self.pool) {
            Ok(command)
        } else {
            warn!("command {} refused: payload from another pool", command.task_command());
            Err(command)
        }
    }

    pub fn try_receive(&self) -> Result<Command<'p>, CommandError> {
        let frame = self
            .channel
            .try_receive()
            .map_err(|_| CommandError::QueueEmpty)?;
        Command::from_frame(frame, self.pool)
    }

    pub async fn receive(&self, wait: Wait) -> Result<Command<'p>, CommandError> {
        let frame = match wait {
            Wait::Poll => return self.try_receive(),
            Wait::For(d) => with_timeout(d, self.channel.receive())
                .await
                .map_err(|_| CommandError::Timeout)?,
            Wait::Forever => self.channel.receive().await,
        };
        Command::from_frame(frame, self.pool)
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }
}
