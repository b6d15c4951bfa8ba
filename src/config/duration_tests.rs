// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for duration parsing (Go-style duration format)

#[cfg(test)]
mod tests {
    use super::super::parse_duration;
    use std::time::Duration;

    // ========================================================================
    // Valid Duration Parsing Tests
    // ========================================================================

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(
            parse_duration("30s").unwrap(),
            Duration::from_secs(30),
            "30s should be 30 seconds"
        );
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_duration_milliseconds() {
        assert_eq!(
            parse_duration("500ms").unwrap(),
            Duration::from_millis(500),
            "500ms should be half a second"
        );
    }

    #[test]
    fn test_parse_duration_minutes_and_hours() {
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_compound() {
        assert_eq!(
            parse_duration("1m30s").unwrap(),
            Duration::from_secs(90),
            "1m30s should be 90 seconds"
        );
        assert_eq!(
            parse_duration("1h1m1s500ms").unwrap(),
            Duration::from_millis(3_661_500)
        );
    }

    // ========================================================================
    // Invalid Duration Tests
    // ========================================================================

    #[test]
    fn test_parse_duration_empty() {
        let result = parse_duration("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_parse_duration_missing_unit() {
        assert!(parse_duration("30").is_err(), "30 without unit should fail");
    }

    #[test]
    fn test_parse_duration_missing_value() {
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10ss").is_err());
    }

    #[test]
    fn test_parse_duration_invalid_unit() {
        let result = parse_duration("10d");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unsupported duration unit"));
    }

    #[test]
    fn test_parse_duration_zero() {
        assert!(parse_duration("0s").is_err(), "zero timeout is rejected");
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("99999999999999999999h").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
    }
}
