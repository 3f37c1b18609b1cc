//! Monotonic time points used for staleness detection.
//!
//! Dirty events and configuration changes are ordered by comparing time
//! points. Two calls to [`TimePoint::now`] never return the same value, so a
//! dirty event recorded after a snapshot is always distinguishable from the
//! one the snapshot captured.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds since [`EPOCH`] of the last issued time point.
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// A point on the process-wide monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(u64);

impl TimePoint {
    /// Returns the current time point.
    ///
    /// Values are strictly increasing across all threads. Two calls landing
    /// on the same clock tick are spread one nanosecond apart.
    pub fn now() -> Self {
        let elapsed = u64::try_from(epoch().elapsed().as_nanos()).unwrap_or(u64::MAX);
        let next = |previous: u64| elapsed.max(previous.saturating_add(1));

        let previous = LAST_ISSUED
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| Some(next(p)))
            .unwrap_or_else(|p| p);
        Self(next(previous))
    }

    /// Returns the underlying instant.
    pub fn instant(self) -> Instant {
        epoch() + Duration::from_nanos(self.0)
    }

    /// Time elapsed since this point.
    pub fn elapsed(self) -> Duration {
        self.instant().elapsed()
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({:?} ago)", self.elapsed())
    }
}
