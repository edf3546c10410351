//! NMEA sentence capture from the raw GPS byte stream.
//!
//! [`NmeaFramer`] is the pure byte-at-a-time state machine, [`GpsLink`] the
//! receive-path wrapper that publishes finished lines into the GPS record,
//! and [`gga`] decodes a captured line once a task picks it up.

pub mod gga;
mod link;

pub use link::{GpsLink, GpsLinkStats, LinkEvent};

use heapless::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramerState {
    /// Waiting for `$`.
    Searching,
    /// Comparing against the target prefix.
    MatchingPrefix,
    /// Prefix matched; buffering until a line terminator.
    Collecting,
}

/// Why the framer threw a partial line away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Discard {
    PrefixMismatch,
    Overflow,
    /// A `$` arrived before the current line ended.
    Restarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feed<'a> {
    Pending,
    Complete(&'a [u8]),
    Discarded(Discard),
}

const START: u8 = b'$';

fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Extracts lines starting with one fixed prefix (for example `$GPGGA`).
///
/// Each call to [`NmeaFramer::feed`] is constant time and never blocks. The
/// buffer holds at most `N` bytes; a longer line is discarded whole.
pub struct NmeaFramer<const N: usize> {
    prefix: &'static [u8],
    line: Vec<u8, N>,
    state: FramerState,
}

impl<const N: usize> NmeaFramer<N> {
    /// `prefix` includes the leading `$`.
    pub const fn new(prefix: &'static [u8]) -> Self {
        Self {
            prefix,
            line: Vec::new(),
            state: FramerState::Searching,
        }
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Drop any partial line and go back to searching.
    pub fn reset(&mut self) {
        self.line.clear();
        self.state = FramerState::Searching;
    }

    pub fn feed(&mut self, byte: u8) -> Feed<'_> {
        if byte == START {
            let restarted = self.state != FramerState::Searching;
            self.begin_line();
            return if restarted {
                Feed::Discarded(Discard::Restarted)
            } else {
                Feed::Pending
            };
        }

        match self.state {
            FramerState::Searching => Feed::Pending,
            FramerState::MatchingPrefix => {
                if is_terminator(byte) || self.prefix.get(self.line.len()) != Some(&byte) {
                    self.reset();
                    return Feed::Discarded(Discard::PrefixMismatch);
                }
                // Prefix bytes never exceed the buffer; checked in `begin_line`.
                let _ = self.line.push(byte);
                if self.line.len() == self.prefix.len() {
                    self.state = FramerState::Collecting;
                }
                Feed::Pending
            }
            FramerState::Collecting => {
                if is_terminator(byte) {
                    self.state = FramerState::Searching;
                    return Feed::Complete(self.line.as_slice());
                }
                if self.line.push(byte).is_err() {
                    self.reset();
                    return Feed::Discarded(Discard::Overflow);
                }
                Feed::Pending
            }
        }
    }

    fn begin_line(&mut self) {
        self.line.clear();
        if self.prefix.first() != Some(&START) || self.prefix.len() > N {
            // Nothing can ever match; stay put.
            self.state = FramerState::Searching;
            return;
        }
        let _ = self.line.push(START);
        self.state = if self.prefix.len() == 1 {
            FramerState::Collecting
        } else {
            FramerState::MatchingPrefix
        };
    }
}
