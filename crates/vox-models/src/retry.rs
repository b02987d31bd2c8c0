//! Bounded retry with cooperative throttling.
//!
//! Wraps a single `ModelAdapter::generate` call:
//! - before each attempt, sleeps out the adapter's own rate-limit window
//!   instead of failing (cooperative throttle; waits are not recorded);
//! - records one tracker entry per attempt that reaches the provider;
//! - retries only transient errors, at most 3 attempts total, with
//!   exponential backoff starting at 1 s and capped at 10 s.

use std::sync::MutexGuard;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

/// Total attempts: the initial call plus two retries.
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Double the backoff, capped.
fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Lock the tracker, recovering from a poisoned mutex.
///
/// The tracker holds only timestamps, which stay valid even if a holder
/// panicked mid-update.
fn lock_tracker(adapter: &dyn ModelAdapter) -> MutexGuard<'_, RateLimitTracker> {
    adapter
        .tracker()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Call `adapter.generate`, throttling and retrying per the policy above.
pub async fn generate_with_retry(
    adapter: &dyn ModelAdapter,
    prompt: &str,
) -> Result<Generation, GenerateError> {
    let model_id = adapter.config().model_id.clone();
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        // Cooperative throttle: wait out our own window rather than fail.
        let wait = lock_tracker(adapter).wait_time(Instant::now());
        if !wait.is_zero() {
            debug!(model = %model_id, wait_ms = wait.as_millis() as u64, "Throttling before attempt");
            tokio::time::sleep(wait).await;
        }

        lock_tracker(adapter).record(Instant::now());

        match adapter.generate(prompt).await {
            Ok(generation) => {
                debug!(
                    model = %model_id,
                    attempt,
                    prompt_tokens = generation.prompt_tokens,
                    response_tokens = generation.response_tokens,
                    "Generation succeeded"
                );
                return Ok(generation);
            }
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(
                    model = %model_id,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
            }
            Err(e) => {
                warn!(model = %model_id, attempt, error = %e, "Generation failed");
                return Err(e);
            }
        }
    }

    // The loop always returns on the final attempt.
    Err(GenerateError::Unexpected(
        "retry loop exhausted without a result".to_string(),
    ))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use vox_core::config::AdapterConfig;

    /// Adapter that replays a scripted list of results.
    struct ScriptedAdapter {
        config: AdapterConfig,
        tracker: Mutex<RateLimitTracker>,
        script: Mutex<VecDeque<Result<Generation, GenerateError>>>,
        calls: AtomicU32,
    }

    impl ScriptedAdapter {
        fn new(cap: u32, script: Vec<Result<Generation, GenerateError>>) -> Self {
            Self {
                config: AdapterConfig {
                    model_id: "scripted".to_string(),
                    provider: "test".to_string(),
                    backend_model_name: "scripted-v1".to_string(),
                    rate_per_minute: cap,
                    capability_tags: vec![],
                },
                tracker: Mutex::new(RateLimitTracker::new(cap)),
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelAdapter for ScriptedAdapter {
        fn config(&self) -> &AdapterConfig {
            &self.config
        }

        fn tracker(&self) -> &Mutex<RateLimitTracker> {
            &self.tracker
        }

        async fn generate(&self, _prompt: &str) -> Result<Generation, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerateError::Unexpected("script empty".into())))
        }
    }

    fn ok_generation(text: &str) -> Result<Generation, GenerateError> {
        Ok(Generation {
            text: text.to_string(),
            prompt_tokens: 12,
            response_tokens: 7,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt_no_backoff() {
        let adapter = ScriptedAdapter::new(0, vec![ok_generation("hi")]);
        let start = tokio::time::Instant::now();

        let result = generate_with_retry(&adapter, "hello").await.unwrap();

        assert_eq!(result.text, "hi");
        assert_eq!(adapter.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let adapter = ScriptedAdapter::new(
            0,
            vec![
                Err(GenerateError::Unavailable("503".into())),
                Err(GenerateError::Unavailable("503".into())),
                ok_generation("finally"),
            ],
        );
        let start = tokio::time::Instant::now();

        let result = generate_with_retry(&adapter, "hello").await.unwrap();

        assert_eq!(result.text, "finally");
        assert_eq!(result.prompt_tokens, 12);
        assert_eq!(result.response_tokens, 7);
        assert_eq!(adapter.call_count(), 3);
        // Backoffs: 1s + 2s
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_no_retry() {
        let adapter = ScriptedAdapter::new(
            0,
            vec![Err(GenerateError::PromptRejected("safety".into()))],
        );

        let err = generate_with_retry(&adapter, "hello").await.unwrap_err();

        assert!(matches!(err, GenerateError::PromptRejected(_)));
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_no_retry() {
        let adapter =
            ScriptedAdapter::new(0, vec![Err(GenerateError::NotReady("pulling".into()))]);

        let err = generate_with_retry(&adapter, "hello").await.unwrap_err();

        assert!(matches!(err, GenerateError::NotReady(_)));
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let adapter = ScriptedAdapter::new(
            0,
            vec![
                Err(GenerateError::RateLimited("429".into())),
                Err(GenerateError::RateLimited("429".into())),
                Err(GenerateError::RateLimited("429".into())),
            ],
        );

        let err = generate_with_retry(&adapter, "hello").await.unwrap_err();

        assert!(matches!(err, GenerateError::RateLimited(_)));
        assert_eq!(adapter.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooperative_throttle_waits_out_window() {
        let adapter = ScriptedAdapter::new(1, vec![ok_generation("after wait")]);
        // Fill the window before calling
        adapter
            .tracker
            .lock()
            .unwrap()
            .record(Instant::now());
        let start = tokio::time::Instant::now();

        let result = generate_with_retry(&adapter, "hello").await.unwrap();

        assert_eq!(result.text, "after wait");
        assert_eq!(adapter.call_count(), 1);
        // Slept out (most of) the 60s window before the single attempt
        assert!(start.elapsed() >= Duration::from_secs(59));
    }

    #[test]
    fn test_records_per_attempt() {
        // Each attempt records, even failed ones
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        rt.block_on(async {
            let adapter = ScriptedAdapter::new(
                10,
                vec![
                    Err(GenerateError::Unavailable("503".into())),
                    ok_generation("ok"),
                ],
            );
            generate_with_retry(&adapter, "x").await.unwrap();
            let count = adapter
                .tracker
                .lock()
                .unwrap()
                .current_count(Instant::now());
            assert_eq!(count, 2);
        });
    }

    #[test]
    fn test_next_backoff_caps_at_ten_seconds() {
        let mut d = INITIAL_BACKOFF;
        for _ in 0..10 {
            d = next_backoff(d);
        }
        assert_eq!(d, MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::from_secs(8)), MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::from_secs(2)), Duration::from_secs(4));
    }
}
