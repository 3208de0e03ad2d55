//! Clock-face formatting shared by the countdown and the lockout screen.

/// `H:MM:SS` from one hour up, `M:SS` below, `0:00` for anything non-positive.
#[must_use]
pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return "0:00".to_string();
    }
    let total_secs = remaining_ms / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Countdown display as `minutes:seconds`, minutes unbounded.
#[must_use]
pub fn format_countdown(remaining_ms: i64) -> String {
    let total_secs = remaining_ms.max(0) / 1_000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_or_more_uses_three_fields() {
        assert_eq!(format_remaining(3_600_000), "1:00:00");
        assert_eq!(format_remaining(86_399_000), "23:59:59");
    }

    #[test]
    fn under_an_hour_uses_two_fields() {
        assert_eq!(format_remaining(3_599_000), "59:59");
        assert_eq!(format_remaining(5_000), "0:05");
    }

    #[test]
    fn non_positive_is_zero() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(-1_500), "0:00");
    }

    #[test]
    fn countdown_keeps_minutes_unbounded() {
        assert_eq!(format_countdown(600_000), "10:00");
        assert_eq!(format_countdown(4_000_000), "66:40");
        assert_eq!(format_countdown(-1), "0:00");
    }
}
