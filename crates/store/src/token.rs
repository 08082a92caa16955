use std::time::Duration;

pub const EARLY_SKEW: Duration = Duration::from_millis(10_000);
pub const MIN_DELAY: Duration = Duration::from_millis(5_000);

/// When to refresh an access token relative to its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTiming {
    pub early_skew: Duration,
    pub min_delay: Duration,
}

impl Default for RefreshTiming {
    fn default() -> Self {
        Self {
            early_skew: EARLY_SKEW,
            min_delay: MIN_DELAY,
        }
    }
}

impl RefreshTiming {
    pub fn from_millis(early_skew_ms: u64, min_delay_ms: u64) -> Self {
        Self {
            early_skew: Duration::from_millis(early_skew_ms),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// `max(expires_at - now - early_skew, min_delay)`.
    pub fn refresh_delay(&self, expires_at_ms: i64, now_ms: i64) -> Duration {
        let remaining = expires_at_ms
            .saturating_sub(now_ms)
            .saturating_sub(self.skew_ms());
        let remaining = Duration::from_millis(u64::try_from(remaining).unwrap_or(0));
        remaining.max(self.min_delay)
    }

    /// True once `now` is inside the early-refresh window (or past expiry).
    pub fn is_due(&self, expires_at_ms: i64, now_ms: i64) -> bool {
        now_ms >= expires_at_ms.saturating_sub(self.skew_ms())
    }

    fn skew_ms(&self) -> i64 {
        i64::try_from(self.early_skew.as_millis()).unwrap_or(i64::MAX)
    }
}
