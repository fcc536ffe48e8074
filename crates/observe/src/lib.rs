//! Logging initialization shared by everything that drives the auction
//! engine, including its tests.
pub mod tracing;
