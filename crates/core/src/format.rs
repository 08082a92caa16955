/// Split a duration in seconds into whole minutes and remaining seconds.
pub fn minutes_seconds(total_seconds: u64) -> (u64, u64) {
    (total_seconds / 60, total_seconds % 60)
}

/// Human-readable duration, e.g. `"1 minute 5 seconds"`.
pub fn format_duration(total_seconds: u64) -> String {
    let (minutes, seconds) = minutes_seconds(total_seconds);
    let m = if minutes == 1 { "minute" } else { "minutes" };
    let s = if seconds == 1 { "second" } else { "seconds" };
    format!("{minutes} {m} {seconds} {s}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralises_each_unit_independently() {
        assert_eq!(format_duration(0), "0 minutes 0 seconds");
        assert_eq!(format_duration(61), "1 minute 1 second");
        assert_eq!(format_duration(125), "2 minutes 5 seconds");
    }
}
