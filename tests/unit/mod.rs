//! Unit tests for individual components

mod error_test;
mod config_test;
mod clock_test;
mod builders_test;
mod runtime_test;
