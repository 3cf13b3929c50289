//! Shared utilities: latency and bandwidth unit parsing.

pub mod units;

pub use units::{parse_bandwidth_mbit, parse_latency_millis, UnitParseError};
