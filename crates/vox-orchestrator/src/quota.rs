//! Session-wide quota tracking — RPM, TPM, and RPD ceilings.
//!
//! Independent of per-adapter rate limiting: this tracker guards the whole
//! session against free-tier exhaustion, whichever model serves a request.
//! Methods take `now` explicitly so tests can simulate time and day
//! rollovers.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use vox_core::config::QuotaConfig;

/// Which ceiling blocked the request. Display cites the configured value so
/// the user hears a concrete number, not a vague refusal.
#[derive(Debug, Error, PartialEq)]
pub enum QuotaExceeded {
    #[error("requests-per-minute ceiling of {0} reached, please wait a moment")]
    Rpm(u32),

    #[error("daily request ceiling of {0} reached, quota resets at midnight UTC")]
    Rpd(u32),
}

/// Rolling RPM/TPM windows plus a UTC-day request counter.
pub struct QuotaTracker {
    limits: QuotaConfig,
    request_times: VecDeque<DateTime<Utc>>,
    token_usage: VecDeque<(DateTime<Utc>, u32)>,
    daily_count: u32,
    current_day: NaiveDate,
}

impl QuotaTracker {
    pub fn new(limits: QuotaConfig, now: DateTime<Utc>) -> Self {
        Self {
            limits,
            request_times: VecDeque::new(),
            token_usage: VecDeque::new(),
            daily_count: 0,
            current_day: now.date_naive(),
        }
    }

    pub fn limits(&self) -> &QuotaConfig {
        &self.limits
    }

    /// Check whether a new request may proceed at `now`.
    ///
    /// TPM is deliberately not checked here: the response size is unknown
    /// before the call, so tokens are only monitored after the fact.
    pub fn can_proceed(&mut self, now: DateTime<Utc>) -> Result<(), QuotaExceeded> {
        self.roll_day(now);
        self.prune(now);

        if self.request_times.len() >= self.limits.rpm as usize {
            return Err(QuotaExceeded::Rpm(self.limits.rpm));
        }
        if self.daily_count >= self.limits.rpd {
            return Err(QuotaExceeded::Rpd(self.limits.rpd));
        }
        Ok(())
    }

    /// Record one completed request and its token usage.
    pub fn record_usage(&mut self, now: DateTime<Utc>, prompt_tokens: u32, response_tokens: u32) {
        self.roll_day(now);
        self.request_times.push_back(now);
        self.token_usage
            .push_back((now, prompt_tokens + response_tokens));
        self.daily_count += 1;
        self.prune(now);
    }

    /// Requests in the trailing minute.
    pub fn current_rpm(&mut self, now: DateTime<Utc>) -> u32 {
        self.prune(now);
        self.request_times.len() as u32
    }

    /// Tokens in the trailing minute.
    pub fn current_tpm(&mut self, now: DateTime<Utc>) -> u32 {
        self.prune(now);
        self.token_usage.iter().map(|(_, t)| t).sum()
    }

    /// Requests so far this UTC day.
    pub fn daily_count(&self) -> u32 {
        self.daily_count
    }

    /// Whether the trailing minute is over the TPM ceiling. Advisory only.
    pub fn tpm_exceeded(&mut self, now: DateTime<Utc>) -> bool {
        self.current_tpm(now) > self.limits.tpm
    }

    /// Reset the daily counter when the UTC day changes.
    ///
    /// Only the daily count resets; the rolling windows keep their entries
    /// and expire naturally.
    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.current_day {
            self.current_day = today;
            self.daily_count = 0;
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(60);
        while self
            .request_times
            .front()
            .is_some_and(|t| *t <= cutoff)
        {
            self.request_times.pop_front();
        }
        while self.token_usage.front().is_some_and(|(t, _)| *t <= cutoff) {
            self.token_usage.pop_front();
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn limits(rpm: u32, tpm: u32, rpd: u32) -> QuotaConfig {
        QuotaConfig { rpm, tpm, rpd }
    }

    #[test]
    fn test_can_proceed_under_limits() {
        let mut tracker = QuotaTracker::new(limits(5, 1000, 100), t0());
        assert!(tracker.can_proceed(t0()).is_ok());
    }

    #[test]
    fn test_rpm_ceiling_blocks() {
        let mut tracker = QuotaTracker::new(limits(2, 1000, 100), t0());
        tracker.record_usage(t0(), 10, 5);
        tracker.record_usage(t0(), 10, 5);

        let err = tracker.can_proceed(t0()).unwrap_err();
        assert_eq!(err, QuotaExceeded::Rpm(2));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_rpm_window_expires() {
        let mut tracker = QuotaTracker::new(limits(1, 1000, 100), t0());
        tracker.record_usage(t0(), 10, 5);
        assert!(tracker.can_proceed(t0()).is_err());

        let later = t0() + Duration::seconds(61);
        assert!(tracker.can_proceed(later).is_ok());
        assert_eq!(tracker.current_rpm(later), 0);
    }

    #[test]
    fn test_rpd_ceiling_blocks() {
        let mut tracker = QuotaTracker::new(limits(100, 100_000, 3), t0());
        for i in 0..3 {
            tracker.record_usage(t0() + Duration::seconds(i), 10, 5);
        }

        let err = tracker.can_proceed(t0() + Duration::seconds(10)).unwrap_err();
        assert_eq!(err, QuotaExceeded::Rpd(3));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_day_rollover_resets_daily_only() {
        let mut tracker = QuotaTracker::new(limits(100, 100_000, 2), t0());
        tracker.record_usage(t0(), 10, 5);
        tracker.record_usage(t0() + Duration::seconds(1), 10, 5);
        assert!(tracker.can_proceed(t0() + Duration::seconds(2)).is_err());

        // Cross midnight UTC, 30 seconds after the last request
        let next_day = Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap();
        let mut tracker2 = QuotaTracker::new(limits(100, 100_000, 2), t0());
        let before_midnight = Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 40).unwrap();
        tracker2.record_usage(before_midnight, 10, 5);
        tracker2.record_usage(before_midnight, 10, 5);

        assert!(tracker2.can_proceed(next_day).is_ok());
        assert_eq!(tracker2.daily_count(), 0);
        // The rolling minute window still holds the pre-midnight requests
        assert_eq!(tracker2.current_rpm(next_day), 2);
    }

    #[test]
    fn test_tpm_monitored_not_enforced() {
        let mut tracker = QuotaTracker::new(limits(100, 50, 100), t0());
        tracker.record_usage(t0(), 40, 30);

        // 70 tokens in the window, ceiling 50: advisory flag set, but
        // can_proceed still allows the next request.
        assert!(tracker.tpm_exceeded(t0()));
        assert_eq!(tracker.current_tpm(t0()), 70);
        assert!(tracker.can_proceed(t0()).is_ok());
    }

    #[test]
    fn test_token_window_expires() {
        let mut tracker = QuotaTracker::new(limits(100, 1000, 100), t0());
        tracker.record_usage(t0(), 100, 50);
        assert_eq!(tracker.current_tpm(t0()), 150);

        let later = t0() + Duration::seconds(61);
        assert_eq!(tracker.current_tpm(later), 0);
    }

    #[test]
    fn test_daily_count_accumulates() {
        let mut tracker = QuotaTracker::new(limits(100, 100_000, 100), t0());
        for i in 0..5 {
            tracker.record_usage(t0() + Duration::seconds(i * 70), 1, 1);
        }
        // Rolling window only sees the latest, the day sees all
        assert_eq!(tracker.daily_count(), 5);
        assert_eq!(tracker.current_rpm(t0() + Duration::seconds(4 * 70)), 1);
    }
}
