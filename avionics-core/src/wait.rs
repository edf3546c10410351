use embassy_time::Duration;

/// How long a caller is willing to be suspended on a lock or queue.
///
/// Interrupt handlers may only use [`Wait::Poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// Try once and return immediately.
    Poll,
    /// Suspend for at most this long.
    For(Duration),
    /// Suspend until the resource is available.
    Forever,
}

impl Wait {
    pub const fn millis(ms: u64) -> Self {
        Wait::For(Duration::from_millis(ms))
    }

    pub const fn is_poll(&self) -> bool {
        matches!(self, Wait::Poll)
    }
}

impl From<Duration> for Wait {
    fn from(d: Duration) -> Self {
        if d.as_ticks() == 0 {
            Wait::Poll
        } else {
            Wait::For(d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_is_poll() {
        assert_eq!(Wait::from(Duration::from_ticks(0)), Wait::Poll);
        assert!(Wait::from(Duration::from_ticks(0)).is_poll());
    }

    #[test]
    fn test_nonzero_duration_is_bounded() {
        let w = Wait::from(Duration::from_millis(3));
        assert_eq!(w, Wait::millis(3));
        assert!(!w.is_poll());
    }
}
