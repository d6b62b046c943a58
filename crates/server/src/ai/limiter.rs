//! Fixed-window request counter guarding the AI flows.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Length of one counting window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Admits at most `limit` requests per window.
///
/// The window opens with the first request after the previous one expired,
/// so bursts straddling a boundary can see up to `2 * limit` requests in 60
/// seconds.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug, Default)]
struct WindowState {
    started: Option<Instant>,
    count: u32,
}

impl FixedWindowLimiter {
    /// A limiter with a 60 second window.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, WINDOW)
    }

    #[must_use]
    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(WindowState::default()),
        }
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request at `now`.
    ///
    /// # Errors
    ///
    /// Returns the time left in the current window when the limit is reached.
    pub fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let expired = state
            .started
            .is_none_or(|started| now.saturating_duration_since(started) >= self.window);
        if expired {
            state.started = Some(now);
            state.count = 0;
        }

        if state.count >= self.limit {
            let elapsed = state
                .started
                .map_or(Duration::ZERO, |started| now.saturating_duration_since(started));
            return Err(self.window.saturating_sub(elapsed));
        }

        state.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_exactly_limit_per_window() {
        let limiter = FixedWindowLimiter::new(3);
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter.try_acquire(t0 + Duration::from_secs(i)).is_ok());
        }
        let retry = limiter
            .try_acquire(t0 + Duration::from_secs(10))
            .expect_err("fourth request rejected");
        assert_eq!(retry, Duration::from_secs(50));
    }

    #[test]
    fn test_window_resets_after_sixty_seconds() {
        let limiter = FixedWindowLimiter::new(1);
        let t0 = Instant::now();

        assert!(limiter.try_acquire(t0).is_ok());
        assert!(limiter.try_acquire(t0 + Duration::from_secs(59)).is_err());
        assert!(limiter.try_acquire(t0 + WINDOW).is_ok());
        assert!(limiter.try_acquire(t0 + WINDOW + Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let limiter = FixedWindowLimiter::new(0);
        assert!(limiter.try_acquire(Instant::now()).is_err());
    }
}
