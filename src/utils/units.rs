//! Latency and bandwidth string parsing.
//!
//! Topology files describe link weights as human-readable strings
//! (e.g., "5ms", "1 Gbit"). The engine works in milliseconds and Mbit/s.

use std::sync::LazyLock;

use humantime_serde::re::humantime;
use regex::Regex;

/// Bandwidth assumed for links that do not declare one, in Mbit/s.
pub const DEFAULT_BANDWIDTH_MBIT: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitParseError {
    #[error("Invalid latency format: {0}")]
    InvalidLatency(String),

    #[error("Invalid bandwidth format: {0}")]
    InvalidBandwidth(String),
}

static BANDWIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<value>[0-9]+(?:\.[0-9]+)?)\s*(?P<prefix>[kmgt]?)(?P<unit>bit|bps)?$")
        .expect("Invalid bandwidth regex")
});

/// Parse a latency string into milliseconds.
///
/// Accepts a bare number (already milliseconds) or any humantime duration:
/// "5ms", "1s", "250us", "1m 30s".
///
/// # Examples
/// ```
/// use netdelay::utils::units::parse_latency_millis;
///
/// assert_eq!(parse_latency_millis("12.5"), Ok(12.5));
/// assert_eq!(parse_latency_millis("5ms"), Ok(5.0));
/// assert_eq!(parse_latency_millis("2s"), Ok(2000.0));
/// assert!(parse_latency_millis("fast").is_err());
/// ```
pub fn parse_latency_millis(latency: &str) -> Result<f64, UnitParseError> {
    let latency = latency.trim();

    if let Ok(millis) = latency.parse::<f64>() {
        return Ok(millis);
    }

    humantime::parse_duration(latency)
        .map(|duration| duration.as_nanos() as f64 / 1e6)
        .map_err(|_| UnitParseError::InvalidLatency(latency.to_string()))
}

/// Parse a bandwidth string into Mbit/s.
///
/// A bare number is Mbit/s. A decimal prefix (K, M, G, T) without unit is
/// read as bits with that prefix, and "bit"/"bps" without prefix as plain
/// bits per second.
///
/// # Examples
/// ```
/// use netdelay::utils::units::parse_bandwidth_mbit;
///
/// assert_eq!(parse_bandwidth_mbit("100"), Ok(100.0));
/// assert_eq!(parse_bandwidth_mbit("1 Gbit"), Ok(1000.0));
/// assert_eq!(parse_bandwidth_mbit("500 Kbit"), Ok(0.5));
/// assert!(parse_bandwidth_mbit("lots").is_err());
/// ```
pub fn parse_bandwidth_mbit(bandwidth: &str) -> Result<f64, UnitParseError> {
    let bandwidth = bandwidth.trim();
    let invalid = || UnitParseError::InvalidBandwidth(bandwidth.to_string());

    let captures = BANDWIDTH.captures(bandwidth).ok_or_else(invalid)?;
    let value: f64 = captures["value"].parse().map_err(|_| invalid())?;
    let prefix = captures["prefix"].to_ascii_lowercase();
    let has_unit = captures.name("unit").is_some();

    let mbit = match prefix.as_str() {
        "k" => value / 1e3,
        "m" => value,
        "g" => value * 1e3,
        "t" => value * 1e6,
        _ if has_unit => value / 1e6,
        _ => value,
    };

    Ok(mbit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latency() {
        assert_eq!(parse_latency_millis("0"), Ok(0.0));
        assert_eq!(parse_latency_millis("3"), Ok(3.0));
        assert_eq!(parse_latency_millis(" 7.25 "), Ok(7.25));
        assert_eq!(parse_latency_millis("5ms"), Ok(5.0));
        assert_eq!(parse_latency_millis("250us"), Ok(0.25));
        assert_eq!(parse_latency_millis("1s"), Ok(1000.0));
        assert_eq!(parse_latency_millis("1m"), Ok(60_000.0));

        assert!(parse_latency_millis("").is_err());
        assert!(parse_latency_millis("5 parsecs").is_err());
    }

    #[test]
    fn test_parse_bandwidth() {
        assert_eq!(parse_bandwidth_mbit("100"), Ok(100.0));
        assert_eq!(parse_bandwidth_mbit("100 Mbit"), Ok(100.0));
        assert_eq!(parse_bandwidth_mbit("100Mbit"), Ok(100.0));
        assert_eq!(parse_bandwidth_mbit("1 Gbit"), Ok(1000.0));
        assert_eq!(parse_bandwidth_mbit("10 gbps"), Ok(10_000.0));
        assert_eq!(parse_bandwidth_mbit("2T"), Ok(2_000_000.0));
        assert_eq!(parse_bandwidth_mbit("250 Kbit"), Ok(0.25));
        assert_eq!(parse_bandwidth_mbit("2000000 bit"), Ok(2.0));

        assert!(parse_bandwidth_mbit("").is_err());
        assert!(parse_bandwidth_mbit("fast").is_err());
        assert!(parse_bandwidth_mbit("-5 Mbit").is_err());
        assert!(parse_bandwidth_mbit("5 Xbit").is_err());
    }
}
