//! Per-trace time base.
//!
//! Timestamps inside one process are taken from a monotonic clock. To make
//! them comparable with timestamps taken by other processes of the same
//! trace, a [`ClockAnchor`] records, once at root creation, how far the
//! monotonic reading is from wall-clock epoch time. Every context derived from
//! that root carries the same anchor, so all of them convert monotonic
//! readings with the same offset.
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

static MONOTONIC_ORIGIN: OnceLock<Instant> = OnceLock::new();

fn monotonic_nanos() -> u64 {
    MONOTONIC_ORIGIN
        .get_or_init(Instant::now)
        .elapsed()
        .as_nanos() as u64
}

fn epoch_now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Offset between the process-local monotonic clock and epoch time.
///
/// The anchor is a plain value; deriving a child context copies it instead of
/// capturing a new one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClockAnchor {
    offset_nanos: u64,
}

impl ClockAnchor {
    /// The anchor of a context that has not been initialized.
    pub const UNSET: ClockAnchor = ClockAnchor { offset_nanos: 0 };

    /// Captures the current offset between the monotonic clock and epoch time.
    pub fn new() -> Self {
        let monotonic = monotonic_nanos();
        ClockAnchor {
            offset_nanos: epoch_now_nanos().saturating_sub(monotonic),
        }
    }

    /// Rebuilds an anchor from a previously captured offset.
    pub const fn from_offset_nanos(offset_nanos: u64) -> Self {
        ClockAnchor { offset_nanos }
    }

    /// The captured offset.
    pub fn offset(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos)
    }

    /// The captured offset in nanoseconds.
    pub const fn offset_nanos(&self) -> u64 {
        self.offset_nanos
    }

    /// Returns `false` for [`ClockAnchor::UNSET`].
    pub const fn is_set(&self) -> bool {
        self.offset_nanos != 0
    }

    /// Current time in nanoseconds since the epoch, as seen through this anchor.
    pub fn epoch_nanos(&self) -> u64 {
        self.offset_nanos.saturating_add(monotonic_nanos())
    }
}
