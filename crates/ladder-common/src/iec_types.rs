#![allow(non_camel_case_types)]

//! IEC 61131-3 type aliases used by the logic engine.
//!
//! The engine stores all time values as `TIME` (i64 nanoseconds) and all
//! word values as `DINT` (i32), wide enough for counter presets plus one
//! scan's change without overflow.

/// IEC BOOL.
pub type BOOL = bool;
/// IEC INT (16-bit signed).
pub type INT = i16;
/// IEC DINT (32-bit signed); the image word type and counter value type.
pub type DINT = i32;
/// IEC TIME as nanoseconds.
pub type TIME = i64;

/// One millisecond in `TIME` units.
pub const MILLISECOND: TIME = 1_000_000;
/// One second in `TIME` units.
pub const SECOND: TIME = 1_000_000_000;

/// Convert a `std::time::Duration` to `TIME`, saturating on overflow.
#[must_use]
pub fn time_from_duration(duration: std::time::Duration) -> TIME {
    TIME::try_from(duration.as_nanos()).unwrap_or(TIME::MAX)
}

/// Convert a non-negative `TIME` to a `std::time::Duration`.
///
/// Negative values clamp to zero.
#[must_use]
pub fn duration_from_time(time: TIME) -> std::time::Duration {
    std::time::Duration::from_nanos(u64::try_from(time).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_duration_round_trip() {
        let d = Duration::from_millis(100);
        assert_eq!(time_from_duration(d), 100 * MILLISECOND);
        assert_eq!(duration_from_time(100 * MILLISECOND), d);
    }

    #[test]
    fn test_negative_time_clamps_to_zero() {
        assert_eq!(duration_from_time(-5), Duration::ZERO);
    }
}
