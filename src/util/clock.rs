//! Pacing arithmetic for dispatch cycles.

use std::time::Duration;

use tokio::time::Instant;

/// Earliest instant the next cycle may start.
///
/// With no previous cycle the answer is `now`. Otherwise it is
/// `last + interval`, clamped so it is never in the past. Scheduling against
/// the previous slot rather than against `now` keeps the cadence free of drift.
pub fn next_slot(last: Option<Instant>, interval: Duration, now: Instant) -> Instant {
    match last {
        Some(last) => (last + interval).max(now),
        None => now,
    }
}

/// Time left until the next slot, zero when it is already due.
pub fn remaining_delay(last: Option<Instant>, interval: Duration, now: Instant) -> Duration {
    next_slot(last, interval, now).saturating_duration_since(now)
}
