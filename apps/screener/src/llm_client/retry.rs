//! Bounded retry with backoff, shared by every model call site.
//!
//! A policy is (max attempts, backoff function). `run` additionally takes the
//! acceptance predicate: a response is only kept when the predicate turns it
//! into a value. Transport errors and rejected responses are treated alike.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::truncate_for_log;
use crate::llm_client::LlmError;

/// Backoff before attempt `attempt + 1`, given the 0-based index of the
/// attempt that just failed.
pub type BackoffFn = fn(u32) -> Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub label: &'static str,
    pub max_attempts: u32,
    pub backoff: BackoffFn,
}

/// `2^attempt` seconds: 1s, 2s, 4s, ...
pub fn exponential_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// `min(2^attempt + 5, 60)` seconds, for the stricter scoring quota.
pub fn offset_exponential_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).saturating_add(5).min(60))
}

impl RetryPolicy {
    pub const EXTRACTION: RetryPolicy = RetryPolicy {
        label: "extraction",
        max_attempts: 3,
        backoff: exponential_backoff,
    };

    pub const SCORING: RetryPolicy = RetryPolicy {
        label: "scoring",
        max_attempts: 5,
        backoff: offset_exponential_backoff,
    };

    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Calls `call` until `accept` yields a value or attempts run out.
    ///
    /// Sleeps between attempts only; there is no sleep after the final one.
    /// Returns `None` on exhaustion so callers can substitute their default.
    pub async fn run<T, F, Fut, A>(&self, mut call: F, accept: A) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<String, LlmError>>,
        A: Fn(&str) -> Option<T>,
    {
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.delay_for(attempt - 1)).await;
            }

            match call(attempt).await {
                Ok(text) if text.trim().is_empty() => {
                    warn!("{} attempt {} returned an empty response", self.label, attempt + 1);
                }
                Ok(text) => match accept(&text) {
                    Some(value) => return Some(value),
                    None => warn!(
                        "{} attempt {} returned invalid output",
                        self.label,
                        attempt + 1
                    ),
                },
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        "{} error (attempt {}): {}",
                        self.label,
                        attempt + 1,
                        truncate_for_log(&message)
                    );
                }
            }
        }

        warn!(
            "{} gave up after {} attempts",
            self.label, self.max_attempts
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_extraction_backoff_schedule() {
        let delays: Vec<u64> = (0..3)
            .map(|a| RetryPolicy::EXTRACTION.delay_for(a).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4]);
    }

    #[test]
    fn test_scoring_backoff_schedule_is_capped() {
        let delays: Vec<u64> = (0..7)
            .map(|a| RetryPolicy::SCORING.delay_for(a).as_secs())
            .collect();
        assert_eq!(delays, vec![6, 7, 9, 13, 21, 37, 60]);
        assert_eq!(RetryPolicy::SCORING.delay_for(40).as_secs(), 60);
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        for policy in [RetryPolicy::EXTRACTION, RetryPolicy::SCORING] {
            let delays: Vec<Duration> = (0..policy.max_attempts).map(|a| policy.delay_for(a)).collect();
            assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{}", policy.label);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_valid_response_wins_without_sleeping() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = RetryPolicy::EXTRACTION
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, LlmError>("42".to_string()) }
                },
                |text| text.parse::<u32>().ok(),
            )
            .await;

        assert_eq!(result, Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transport_error_and_invalid_output() {
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::EXTRACTION
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        match attempt {
                            0 => Err(LlmError::EmptyContent),
                            1 => Ok("not a number".to_string()),
                            _ => Ok("7".to_string()),
                        }
                    }
                },
                |text| text.parse::<u32>().ok(),
            )
            .await;

        assert_eq!(result, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_makes_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Option<u32> = RetryPolicy::EXTRACTION
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, LlmError>("   ".to_string()) }
                },
                |text| text.parse::<u32>().ok(),
            )
            .await;

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s between the three attempts
        assert_eq!(start.elapsed().as_secs(), 3);
    }
}
