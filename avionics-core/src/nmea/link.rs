use super::{Discard, Feed, FramerState, NmeaFramer};
use crate::config::NMEA_MAX_LENGTH;
use crate::record::{GpsRecord, SharedRecord};

/// Outcome of one received byte on the GPS link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Pending,
    /// A complete sentence was written to the GPS record.
    Published,
    /// A complete sentence was dropped because the record was locked.
    DroppedBusy,
    Discarded(Discard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsLinkStats {
    pub published: u32,
    pub dropped_busy: u32,
    pub overflows: u32,
    pub mismatches: u32,
}

/// Receive path from the GPS UART to the shared GPS record.
///
/// Completed sentences are published with a single non-blocking lock
/// attempt. When a consumer holds the record the sentence is lost and the
/// link keeps extracting; it never waits inside the receive path.
pub struct GpsLink<'a, const N: usize = NMEA_MAX_LENGTH> {
    framer: NmeaFramer<N>,
    record: &'a SharedRecord<GpsRecord>,
    pub(super) stats: GpsLinkStats,
}

impl<'a, const N: usize> GpsLink<'a, N> {
    pub const fn new(prefix: &'static [u8], record: &'a SharedRecord<GpsRecord>) -> Self {
        Self {
            framer: NmeaFramer::new(prefix),
            record,
            stats: GpsLinkStats {
                published: 0,
                dropped_busy: 0,
                overflows: 0,
                mismatches: 0,
            },
        }
    }

    pub fn on_byte(&mut self, byte: u8) -> LinkEvent {
        match self.framer.feed(byte) {
            Feed::Pending => LinkEvent::Pending,
            Feed::Discarded(reason) => {
                match reason {
                    Discard::Overflow => {
                        self.stats.overflows = self.stats.overflows.wrapping_add(1);
                    }
                    Discard::PrefixMismatch => {
                        self.stats.mismatches = self.stats.mismatches.wrapping_add(1);
                    }
                    Discard::Restarted => {}
                }
                LinkEvent::Discarded(reason)
            }
            Feed::Complete(line) => match self.record.try_acquire() {
                Ok(mut gps) => {
                    if gps.store_line(line) {
                        self.stats.published = self.stats.published.wrapping_add(1);
                        LinkEvent::Published
                    } else {
                        self.stats.overflows = self.stats.overflows.wrapping_add(1);
                        LinkEvent::Discarded(Discard::Overflow)
                    }
                }
                Err(_) => {
                    self.stats.dropped_busy = self.stats.dropped_busy.wrapping_add(1);
                    trace!("gps record busy, sentence dropped");
                    LinkEvent::DroppedBusy
                }
            },
        }
    }

    /// Feed a received chunk. Returns how many sentences were published.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .filter(|&&b| self.on_byte(b) == LinkEvent::Published)
            .count()
    }

    /// Forget any partial line. Call whenever bytes may have been lost on
    /// the wire, so the tail of one sentence is never joined to the next.
    pub fn reset(&mut self) {
        if self.framer.state() != FramerState::Searching {
            debug!("gps link reset mid-line");
        }
        self.framer.reset();
    }

    pub fn stats(&self) -> GpsLinkStats {
        self.stats
    }

    pub fn framer(&self) -> &NmeaFramer<N> {
        &self.framer
    }
}
