//! Shared utilities.

pub mod clock;
pub mod telemetry;

pub use clock::{next_slot, remaining_delay};
pub use telemetry::init_tracing;
