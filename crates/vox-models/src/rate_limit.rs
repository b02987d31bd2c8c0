//! Per-adapter sliding-window rate limiting.
//!
//! Each adapter owns one tracker behind a `Mutex`. All methods take `now`
//! explicitly so tests can simulate time instead of sleeping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Length of the trailing window.
const WINDOW: Duration = Duration::from_secs(60);

/// Tracks request timestamps inside a trailing 60-second window.
///
/// A cap of `0` means unlimited: `is_exceeded` is always false and
/// `wait_time` is always zero.
#[derive(Debug)]
pub struct RateLimitTracker {
    cap: u32,
    timestamps: VecDeque<Instant>,
}

impl RateLimitTracker {
    pub fn new(cap: u32) -> Self {
        Self {
            cap,
            timestamps: VecDeque::new(),
        }
    }

    /// The configured per-minute cap.
    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Record one request at `now`, then prune expired entries.
    pub fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        self.prune(now);
    }

    /// Whether the window is at or over the cap.
    pub fn is_exceeded(&mut self, now: Instant) -> bool {
        if self.cap == 0 {
            return false;
        }
        self.prune(now);
        self.timestamps.len() >= self.cap as usize
    }

    /// Time until the window frees a slot.
    ///
    /// Zero when under the cap; otherwise the time until the oldest entry
    /// ages out of the window, clamped to zero.
    pub fn wait_time(&mut self, now: Instant) -> Duration {
        if !self.is_exceeded(now) {
            return Duration::ZERO;
        }
        match self.timestamps.front() {
            Some(oldest) => (*oldest + WINDOW).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Requests currently inside the window.
    pub fn current_count(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.timestamps.front() {
            if now.saturating_duration_since(*front) >= WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_cap_not_exceeded() {
        let mut tracker = RateLimitTracker::new(3);
        let t0 = Instant::now();
        tracker.record(t0);
        tracker.record(t0);
        assert!(!tracker.is_exceeded(t0));
        assert_eq!(tracker.wait_time(t0), Duration::ZERO);
    }

    #[test]
    fn test_fill_window_exceeds() {
        let mut tracker = RateLimitTracker::new(3);
        let t0 = Instant::now();
        for _ in 0..3 {
            tracker.record(t0);
        }
        assert!(tracker.is_exceeded(t0));
        assert!(tracker.wait_time(t0) > Duration::ZERO);
    }

    #[test]
    fn test_window_expiry_frees_slot() {
        let mut tracker = RateLimitTracker::new(2);
        let t0 = Instant::now();
        tracker.record(t0);
        tracker.record(t0 + Duration::from_secs(30));
        assert!(tracker.is_exceeded(t0 + Duration::from_secs(30)));

        // First entry ages out at t0 + 60s
        let later = t0 + Duration::from_secs(61);
        assert!(!tracker.is_exceeded(later));
        assert_eq!(tracker.current_count(later), 1);
    }

    #[test]
    fn test_wait_time_points_at_oldest_expiry() {
        let mut tracker = RateLimitTracker::new(1);
        let t0 = Instant::now();
        tracker.record(t0);

        let t30 = t0 + Duration::from_secs(30);
        assert_eq!(tracker.wait_time(t30), Duration::from_secs(30));
    }

    #[test]
    fn test_wait_time_monotone_to_zero() {
        let mut tracker = RateLimitTracker::new(1);
        let t0 = Instant::now();
        tracker.record(t0);

        let mut prev = tracker.wait_time(t0);
        for secs in 1..=60u64 {
            let now = t0 + Duration::from_secs(secs);
            let wait = tracker.wait_time(now);
            assert!(wait <= prev, "wait_time must not increase as time passes");
            // wait_time hits zero exactly when is_exceeded flips
            assert_eq!(wait == Duration::ZERO, !tracker.is_exceeded(now));
            prev = wait;
        }
        assert_eq!(prev, Duration::ZERO);
    }

    #[test]
    fn test_zero_cap_is_unlimited() {
        let mut tracker = RateLimitTracker::new(0);
        let t0 = Instant::now();
        for _ in 0..1000 {
            tracker.record(t0);
        }
        assert!(!tracker.is_exceeded(t0));
        assert_eq!(tracker.wait_time(t0), Duration::ZERO);
    }

    #[test]
    fn test_record_prunes() {
        let mut tracker = RateLimitTracker::new(10);
        let t0 = Instant::now();
        tracker.record(t0);
        tracker.record(t0 + Duration::from_secs(120));
        // The t0 entry was pruned by the second record
        assert_eq!(tracker.current_count(t0 + Duration::from_secs(120)), 1);
    }
}
