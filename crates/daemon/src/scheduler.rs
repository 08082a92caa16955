//! Access-token refresh timer.
//!
//! At most one timer is pending. It is re-armed whenever the refresh token
//! or the expiry changes, and stays inert while either is missing.

use callboard_store::RefreshTiming;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
struct Armed {
    refresh_token: String,
    expires_at: i64,
    handle: JoinHandle<()>,
}

/// Sends `()` on its channel when a refresh is due.
#[derive(Debug)]
pub struct TokenScheduler {
    timing: RefreshTiming,
    due_tx: mpsc::UnboundedSender<()>,
    armed: Option<Armed>,
}

impl TokenScheduler {
    pub fn new(timing: RefreshTiming) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            timing,
            due_tx,
            armed: None,
        };
        (scheduler, due_rx)
    }

    pub fn timing(&self) -> RefreshTiming {
        self.timing
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(|a| !a.handle.is_finished())
    }

    /// Bring the timer in line with `schedule` (refresh token, expiry in
    /// epoch ms). Changed inputs cancel the timer and arm a new one, and
    /// `None` leaves it inert. Unchanged inputs never re-arm, even after the
    /// timer has fired, so a slow refresh is not requested twice.
    pub fn sync(&mut self, schedule: Option<(&str, i64)>, now_ms: i64) {
        let Some((refresh_token, expires_at)) = schedule else {
            self.disarm();
            return;
        };

        if let Some(armed) = &self.armed {
            if armed.refresh_token == refresh_token && armed.expires_at == expires_at {
                return;
            }
        }
        self.disarm();

        let delay = self.timing.refresh_delay(expires_at, now_ms);
        debug!(delay_ms = delay.as_millis() as u64, "arming token refresh");
        let deadline = tokio::time::Instant::now() + delay;
        let due_tx = self.due_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = due_tx.send(());
        });
        self.armed = Some(Armed {
            refresh_token: refresh_token.to_string(),
            expires_at,
            handle,
        });
    }

    /// The user came back. True when the token is inside the early-refresh
    /// window (or already expired) and should be refreshed right away.
    pub fn refocus(&self, schedule: Option<(&str, i64)>, now_ms: i64) -> bool {
        schedule.is_some_and(|(_, expires_at)| self.timing.is_due(expires_at, now_ms))
    }

    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.handle.abort();
        }
    }
}

impl Drop for TokenScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::{timeout, Instant};

    const NOW: i64 = 1_700_000_000_000;

    fn scheduler() -> (TokenScheduler, mpsc::UnboundedReceiver<()>) {
        TokenScheduler::new(RefreshTiming::default())
    }

    fn assert_fired_after(start: Instant, ms: u64) {
        let elapsed = start.elapsed();
        let expected = Duration::from_millis(ms);
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(1),
            "fired after {elapsed:?}, expected {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fires_early_skew_before_expiry() {
        let (mut scheduler, mut due) = scheduler();
        let start = Instant::now();
        scheduler.sync(Some(("rt-1", NOW + 60_000)), NOW);

        due.recv().await.expect("refresh due");
        assert_fired_after(start, 50_000);
    }

    #[tokio::test(start_paused = true)]
    async fn near_expiry_waits_minimum_delay() {
        let (mut scheduler, mut due) = scheduler();
        let start = Instant::now();
        scheduler.sync(Some(("rt-1", NOW + 9_000)), NOW);

        due.recv().await.expect("refresh due");
        assert_fired_after(start, 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn new_expiry_replaces_pending_timer() {
        let (mut scheduler, mut due) = scheduler();
        let start = Instant::now();
        scheduler.sync(Some(("rt-1", NOW + 60_000)), NOW);
        scheduler.sync(Some(("rt-1", NOW + 30_000)), NOW);

        due.recv().await.expect("refresh due");
        assert_fired_after(start, 20_000);
        // The first timer was cancelled, so nothing else arrives.
        assert!(timeout(Duration::from_secs(600), due.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_inputs_keep_timer() {
        let (mut scheduler, mut due) = scheduler();
        let start = Instant::now();
        scheduler.sync(Some(("rt-1", NOW + 60_000)), NOW);
        tokio::time::advance(Duration::from_secs(10)).await;
        scheduler.sync(Some(("rt-1", NOW + 60_000)), NOW + 10_000);

        due.recv().await.expect("refresh due");
        assert_fired_after(start, 50_000);
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timer_is_not_rearmed_for_same_inputs() {
        let (mut scheduler, mut due) = scheduler();
        scheduler.sync(Some(("rt-1", NOW + 12_000)), NOW);
        due.recv().await.expect("refresh due");

        // The refresh is still in flight, so the inputs have not moved yet.
        scheduler.sync(Some(("rt-1", NOW + 12_000)), NOW + 5_000);
        assert!(timeout(Duration::from_secs(600), due.recv()).await.is_err());
        assert!(!scheduler.is_armed());

        // The refreshed expiry arms the next one.
        scheduler.sync(Some(("rt-1", NOW + 72_000)), NOW + 5_000);
        assert!(scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_inputs_leave_scheduler_inert() {
        let (mut scheduler, mut due) = scheduler();
        scheduler.sync(Some(("rt-1", NOW + 60_000)), NOW);
        scheduler.sync(None, NOW);
        assert!(!scheduler.is_armed());
        assert!(timeout(Duration::from_secs(600), due.recv()).await.is_err());
    }

    #[test]
    fn refocus_inside_window_is_due() {
        let (scheduler, _due) = TokenScheduler::new(RefreshTiming::default());
        assert!(scheduler.refocus(Some(("rt", NOW + 9_000)), NOW));
        assert!(scheduler.refocus(Some(("rt", NOW - 1)), NOW));
        assert!(!scheduler.refocus(Some(("rt", NOW + 60_000)), NOW));
        assert!(!scheduler.refocus(None, NOW));
    }
}
