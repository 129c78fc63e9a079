//! Sliding-window limits for WebSocket gesture messages.
//!
//! Stage animations are cosmetic, so a flood of them is dropped rather than
//! queued. A message must fit both a short burst window and a longer
//! sustained window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One sliding window
#[derive(Debug)]
struct Window {
    hits: VecDeque<Instant>,
    max: usize,
    span: Duration,
}

impl Window {
    fn new(max: usize, span: Duration) -> Self {
        Self {
            hits: VecDeque::with_capacity(max),
            max,
            span,
        }
    }

    fn expire(&mut self, now: Instant) {
        while let Some(oldest) = self.hits.front() {
            if now.duration_since(*oldest) > self.span {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.hits.len() >= self.max
    }

    fn reset_in(&self, now: Instant) -> Option<Duration> {
        self.hits
            .front()
            .map(|oldest| self.span.saturating_sub(now.duration_since(*oldest)))
    }
}

/// Which window turned a message away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limited {
    Burst,
    Sustained,
}

impl Limited {
    pub fn message(self) -> &'static str {
        match self {
            Limited::Burst => "Rate limit exceeded. Please slow down.",
            Limited::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Burst plus sustained sliding-window limiter
#[derive(Debug)]
pub struct RateLimiter {
    burst: Window,
    sustained: Window,
}

impl RateLimiter {
    /// Create a limiter allowing `burst` messages per `burst_span` and
    /// `sustained` messages per `sustained_span`.
    ///
    /// ```
    /// use pr_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1), 10, Duration::from_secs(60));
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_err());
    /// ```
    pub fn new(
        burst: usize,
        burst_span: Duration,
        sustained: usize,
        sustained_span: Duration,
    ) -> Self {
        Self {
            burst: Window::new(burst, burst_span),
            sustained: Window::new(sustained, sustained_span),
        }
    }

    /// 10 messages per second, 100 per minute
    pub fn for_gestures() -> Self {
        Self::new(10, Duration::from_secs(1), 100, Duration::from_secs(60))
    }

    /// Record a message if both windows have room.
    pub fn check(&mut self) -> Result<(), Limited> {
        let now = Instant::now();
        self.burst.expire(now);
        self.sustained.expire(now);

        if self.burst.is_full() {
            return Err(Limited::Burst);
        }
        if self.sustained.is_full() {
            return Err(Limited::Sustained);
        }

        self.burst.hits.push_back(now);
        self.sustained.hits.push_back(now);
        Ok(())
    }

    /// Messages left before the tighter window closes
    pub fn remaining(&self) -> usize {
        let burst = self.burst.max.saturating_sub(self.burst.hits.len());
        let sustained = self.sustained.max.saturating_sub(self.sustained.hits.len());
        burst.min(sustained)
    }

    /// Time until the burst window frees a slot
    pub fn reset_in(&self) -> Option<Duration> {
        self.burst.reset_in(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_burst_window_blocks_then_recovers() {
        let mut limiter =
            RateLimiter::new(2, Duration::from_millis(100), 50, Duration::from_secs(60));

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert_eq!(limiter.check(), Err(Limited::Burst));

        thread::sleep(Duration::from_millis(150));
        assert!(limiter.check().is_ok(), "Should allow after burst window expires");
    }

    #[test]
    fn test_sustained_window_blocks() {
        let mut limiter =
            RateLimiter::new(100, Duration::from_secs(1), 3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert_eq!(limiter.check(), Err(Limited::Sustained));
    }

    #[test]
    fn test_gesture_limiter_allows_ten_per_second() {
        let mut limiter = RateLimiter::for_gestures();

        for _ in 0..10 {
            assert!(limiter.check().is_ok());
        }
        assert_eq!(limiter.check(), Err(Limited::Burst));
    }

    #[test]
    fn test_remaining_tracks_tighter_window() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1), 3, Duration::from_secs(60));
        assert_eq!(limiter.remaining(), 3);

        limiter.check().unwrap();
        assert_eq!(limiter.remaining(), 2);
    }

    #[test]
    fn test_reset_in() {
        let mut limiter = RateLimiter::for_gestures();
        assert!(limiter.reset_in().is_none());

        limiter.check().unwrap();
        let reset = limiter.reset_in().unwrap();
        assert!(reset <= Duration::from_secs(1));
    }

    #[test]
    fn test_rejection_messages_differ() {
        assert_ne!(Limited::Burst.message(), Limited::Sustained.message());
    }
}
