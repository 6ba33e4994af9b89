//! Duration strings such as `500ms`, `10s`, `1h30m` or `-1s`.
//!
//! A duration is an optional sign followed by one or more `<number><unit>`
//! groups. Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. Numbers may
//! have a fractional part. A bare `0` is also accepted.

use crate::error::{MutexError, Result};
use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serializer};
use std::sync::LazyLock;

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|ms|s|m|h))+$")
        .expect("Invalid duration regex")
});

static COMPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").expect("Invalid component regex")
});

const NANOS_PER_MICRO: f64 = 1e3;
const NANOS_PER_MILLI: f64 = 1e6;
const NANOS_PER_SECOND: f64 = 1e9;

/// Parse a duration string into a signed `TimeDelta`.
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let text = input.trim();
    if matches!(text, "0" | "+0" | "-0") {
        return Ok(TimeDelta::zero());
    }

    if !DURATION_REGEX.is_match(text) {
        return Err(MutexError::Config(format!(
            "invalid duration '{}': expected a value like 500ms, 10s or 1h30m",
            input
        )));
    }

    let mut nanos = 0f64;
    for caps in COMPONENT_REGEX.captures_iter(text) {
        let value: f64 = caps[1].parse().map_err(|e| {
            MutexError::Config(format!("invalid duration '{}': {}", input, e))
        })?;
        let scale = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SECOND,
            "m" => 60.0 * NANOS_PER_SECOND,
            "h" => 3600.0 * NANOS_PER_SECOND,
            unit => {
                return Err(MutexError::Config(format!(
                    "invalid duration '{}': unknown unit '{}'",
                    input, unit
                )));
            }
        };
        nanos += value * scale;
    }

    if nanos >= i64::MAX as f64 {
        return Err(MutexError::Config(format!(
            "invalid duration '{}': out of range",
            input
        )));
    }

    let delta = TimeDelta::nanoseconds(nanos.round() as i64);
    Ok(if text.starts_with('-') { -delta } else { delta })
}

/// Format a `TimeDelta` using the largest unit that represents it exactly.
pub fn format_duration(delta: TimeDelta) -> String {
    if delta.is_zero() {
        return "0s".to_string();
    }

    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let Some(nanos) = delta.abs().num_nanoseconds() else {
        return format!("{}{}s", sign, delta.abs().num_seconds());
    };

    const UNITS: [(i64, &str); 6] = [
        (3_600_000_000_000, "h"),
        (60_000_000_000, "m"),
        (1_000_000_000, "s"),
        (1_000_000, "ms"),
        (1_000, "us"),
        (1, "ns"),
    ];
    for (size, unit) in UNITS {
        if nanos % size == 0 {
            return format!("{}{}{}", sign, nanos / size, unit);
        }
    }
    format!("{}{}ns", sign, nanos)
}

/// Serde adapter storing durations as strings in config files.
pub(crate) mod serde_duration {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*delta))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<TimeDelta, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
            Raw::Number(0) => Ok(TimeDelta::zero()),
            Raw::Number(n) => Err(serde::de::Error::custom(format!(
                "duration {} is missing a unit (e.g. {}s)",
                n, n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("500ms").unwrap(), TimeDelta::milliseconds(500));
        assert_eq!(parse_duration("10s").unwrap(), TimeDelta::seconds(10));
        assert_eq!(parse_duration("60m").unwrap(), TimeDelta::minutes(60));
        assert_eq!(parse_duration("2h").unwrap(), TimeDelta::hours(2));
        assert_eq!(parse_duration("15us").unwrap(), TimeDelta::microseconds(15));
        assert_eq!(parse_duration("15µs").unwrap(), TimeDelta::microseconds(15));
        assert_eq!(parse_duration("7ns").unwrap(), TimeDelta::nanoseconds(7));
    }

    #[test]
    fn parses_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration("1.5h").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration(".5s").unwrap(), TimeDelta::milliseconds(500));
        assert_eq!(
            parse_duration("1m30s250ms").unwrap(),
            TimeDelta::milliseconds(90_250)
        );
    }

    #[test]
    fn parses_signs_and_zero() {
        assert_eq!(parse_duration("-1s").unwrap(), TimeDelta::seconds(-1));
        assert_eq!(parse_duration("+1s").unwrap(), TimeDelta::seconds(1));
        assert_eq!(parse_duration("0").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration(" 0s ").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "10", "s", "10x", "1h-30m", "--1s", "1.2.3s", "ten seconds"] {
            let result = parse_duration(input);
            assert!(
                matches!(result, Err(MutexError::Config(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn formats_with_largest_exact_unit() {
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::milliseconds(500)), "500ms");
        assert_eq!(format_duration(TimeDelta::seconds(10)), "10s");
        assert_eq!(format_duration(TimeDelta::minutes(60)), "1h");
        assert_eq!(format_duration(TimeDelta::seconds(90)), "90s");
        assert_eq!(format_duration(TimeDelta::seconds(-1)), "-1s");
    }

    #[test]
    fn format_output_parses_back() {
        for delta in [
            TimeDelta::milliseconds(1500),
            TimeDelta::minutes(-45),
            TimeDelta::microseconds(3),
        ] {
            assert_eq!(parse_duration(&format_duration(delta)).unwrap(), delta);
        }
    }
}
