use time::OffsetDateTime;

/// Whole elapsed seconds between start and stop, floored. Timers never run
/// backwards; a negative span is clamped to zero rather than stored.
pub fn elapsed_seconds(started_at: OffsetDateTime, ended_at: OffsetDateTime) -> i64 {
    (ended_at - started_at).whole_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn five_and_a_half_minutes_is_330_seconds() {
        let start = datetime!(2026-01-05 10:00:00 UTC);
        let stop = datetime!(2026-01-05 10:05:30 UTC);
        assert_eq!(elapsed_seconds(start, stop), 330);
    }

    #[test]
    fn sub_second_remainder_is_floored() {
        let start = datetime!(2026-01-05 10:00:00.000 UTC);
        let stop = datetime!(2026-01-05 10:00:59.999 UTC);
        assert_eq!(elapsed_seconds(start, stop), 59);
    }

    #[test]
    fn zero_span_is_zero() {
        let t = datetime!(2026-01-05 10:00:00 UTC);
        assert_eq!(elapsed_seconds(t, t), 0);
    }

    #[test]
    fn negative_span_clamps_to_zero() {
        let start = datetime!(2026-01-05 10:00:01 UTC);
        let stop = datetime!(2026-01-05 10:00:00 UTC);
        assert_eq!(elapsed_seconds(start, stop), 0);
    }
}
