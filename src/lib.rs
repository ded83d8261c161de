//! redis-stats-probe library
//!
//! Collects Redis INFO and CONFIG GET statistics and turns them into
//! monitoring items.

pub mod client;
pub mod config;
pub mod metrics;
pub mod probe;
pub mod utils;

pub use probe::{CycleFailure, Probe};
