//! Tests for pacing arithmetic

use std::time::Duration;

use paced_queue::util::{next_slot, remaining_delay};
use tokio::time::Instant;

#[test]
fn test_consecutive_slots_keep_cadence() {
    let interval = Duration::from_millis(100);
    let origin = Instant::now();

    // A cycle that ran late does not push later slots further back.
    let first = next_slot(None, interval, origin);
    let second = next_slot(Some(first), interval, origin + Duration::from_millis(60));
    let third = next_slot(Some(second), interval, origin + Duration::from_millis(190));

    assert_eq!(second, origin + interval);
    assert_eq!(third, origin + interval * 2);
}

#[test]
fn test_remaining_delay_never_negative() {
    let interval = Duration::from_millis(100);
    let last = Instant::now();
    let late = last + Duration::from_secs(5);
    assert_eq!(remaining_delay(Some(last), interval, late), Duration::ZERO);
}
