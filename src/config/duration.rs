// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Duration parsing for Go-style duration strings.
//!
//! Timeouts in the configuration file are written as Go-style durations
//! (e.g., "30s", "1m30s", "500ms"). This module parses them into Rust
//! `std::time::Duration` values.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// The string is a sequence of `<integer><unit>` components. Supported units:
/// - `ms` (milliseconds)
/// - `s` (seconds)
/// - `m` (minutes)
/// - `h` (hours)
///
/// # Examples
///
/// ```
/// use ansible_dns_inventory::config::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
///
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err());  // Missing unit
/// assert!(parse_duration("10x").is_err()); // Invalid unit
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - The string is empty or zero
/// - A component is missing its unit or its numeric value
/// - A unit is not supported
/// - The total overflows
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    if duration_str.is_empty() {
        bail!("Duration string cannot be empty");
    }

    let mut rest = duration_str;
    let mut total_millis: u64 = 0;

    while !rest.is_empty() {
        // Find where digits end and unit begins
        let split_pos = rest
            .chars()
            .position(|c| !c.is_ascii_digit())
            .context("Duration must end with a unit (ms, s, m or h)")?;
        if split_pos == 0 {
            bail!("Duration component '{rest}' is missing its numeric value");
        }

        let (value_str, tail) = rest.split_at(split_pos);
        let unit_len = tail
            .chars()
            .position(|c| c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let value: u64 = value_str
            .parse()
            .context("Duration value must be a positive integer")?;

        let factor = match unit {
            "ms" => 1,
            "s" => MILLIS_PER_SECOND,
            "m" => MILLIS_PER_MINUTE,
            "h" => MILLIS_PER_HOUR,
            _ => bail!(
                "Unsupported duration unit '{unit}'. Use 'ms', 's' (seconds), 'm' (minutes) or 'h' (hours)"
            ),
        };

        let millis = value
            .checked_mul(factor)
            .context("Duration value too large (overflow)")?;
        total_millis = total_millis
            .checked_add(millis)
            .context("Duration value too large (overflow)")?;

        rest = next;
    }

    if total_millis == 0 {
        bail!("Duration '{duration_str}' must be greater than zero");
    }

    Ok(Duration::from_millis(total_millis))
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
