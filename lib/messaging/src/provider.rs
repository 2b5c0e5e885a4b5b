//! Mock provider gateway with bounded retries.
//!
//! Outbound sends go through a simulated third-party provider. Each attempt
//! draws an outcome from an injectable [`OutcomeSource`]; transient failures
//! back off exponentially before the next attempt. The outcome source seam
//! exists so tests can script deterministic success/failure sequences
//! instead of relying on the default random draw.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// The result of a single simulated provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider accepted the message.
    Delivered,
    /// Transient provider-side failure (HTTP 5xx class).
    ServerError,
    /// Transient rate limiting (HTTP 429 class).
    RateLimited,
}

impl SendOutcome {
    /// Diagnostic name used in retry logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::ServerError => "http_5xx",
            Self::RateLimited => "http_429",
        }
    }

    /// True when the attempt succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether a failed attempt is worth retrying.
    ///
    /// Both failure classes are currently transient; a future fatal class
    /// (e.g. a 4xx rejection) would return false here and short-circuit the
    /// retry loop.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError | Self::RateLimited)
    }
}

/// Strategy producing the outcome of each provider attempt.
pub trait OutcomeSource: Send + Sync {
    /// Draws the outcome of one attempt against the named provider.
    fn draw(&self, provider: &str) -> SendOutcome;
}

/// Uniform random outcomes, the production default.
#[derive(Debug, Default)]
pub struct UniformOutcomes;

impl OutcomeSource for UniformOutcomes {
    fn draw(&self, _provider: &str) -> SendOutcome {
        match rand::thread_rng().gen_range(0..3) {
            0 => SendOutcome::Delivered,
            1 => SendOutcome::ServerError,
            _ => SendOutcome::RateLimited,
        }
    }
}

/// What the gateway reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Whether the send ultimately succeeded.
    pub success: bool,
    /// Failure detail when `success` is false.
    pub error_detail: Option<String>,
}

impl SendReceipt {
    fn delivered() -> Self {
        Self {
            success: true,
            error_detail: None,
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Retry behavior for the gateway.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,
    /// Backoff time unit; attempt `n` waits `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// The payload handed to a provider on send.
#[derive(Debug, Clone)]
pub struct SendPayload {
    /// Destination address.
    pub to: String,
    /// Message body, if any.
    pub body: Option<String>,
}

/// Simulated outbound provider gateway.
pub struct MockProvider {
    outcomes: Arc<dyn OutcomeSource>,
    policy: RetryPolicy,
}

impl MockProvider {
    /// Creates a gateway with the given outcome strategy and retry policy.
    #[must_use]
    pub fn new(outcomes: Arc<dyn OutcomeSource>, policy: RetryPolicy) -> Self {
        Self { outcomes, policy }
    }

    /// Attempts to deliver `payload` through the named provider.
    ///
    /// Retries transient failures up to the policy's attempt limit, waiting
    /// `base_delay * 2^attempt` between attempts (attempt counted from 1).
    /// The wait suspends only this send; concurrent requests proceed.
    pub async fn send(&self, provider: &str, payload: &SendPayload) -> SendReceipt {
        for attempt in 1..=self.policy.max_attempts {
            let outcome = self.outcomes.draw(provider);
            if outcome.is_success() {
                tracing::debug!(provider, to = %payload.to, attempt, "provider accepted message");
                return SendReceipt::delivered();
            }

            if attempt == self.policy.max_attempts || !outcome.is_retryable() {
                tracing::warn!(
                    provider,
                    outcome = outcome.as_str(),
                    attempt,
                    "provider send attempt failed"
                );
                break;
            }

            let wait = self.policy.backoff_after(attempt);
            tracing::warn!(
                provider,
                outcome = outcome.as_str(),
                attempt,
                wait_ms = wait.as_millis() as u64,
                "provider send attempt failed, backing off"
            );
            tokio::time::sleep(wait).await;
        }

        SendReceipt::failed("Provider failed after retries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays a fixed sequence of outcomes, then delivers.
    struct Script(Mutex<VecDeque<SendOutcome>>);

    impl Script {
        fn new(outcomes: impl IntoIterator<Item = SendOutcome>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(outcomes.into_iter().collect())))
        }
    }

    impl OutcomeSource for Script {
        fn draw(&self, _provider: &str) -> SendOutcome {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(SendOutcome::Delivered)
        }
    }

    fn payload() -> SendPayload {
        SendPayload {
            to: "+15550002".to_string(),
            body: Some("hi".to_string()),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_returns_immediately() {
        let provider = MockProvider::new(
            Script::new([SendOutcome::Delivered]),
            RetryPolicy::default(),
        );
        let receipt = provider.send("twilio", &payload()).await;
        assert!(receipt.success);
        assert_eq!(receipt.error_detail, None);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_back_off_exponentially() {
        let provider = MockProvider::new(
            Script::new([SendOutcome::ServerError, SendOutcome::RateLimited]),
            RetryPolicy::default(),
        );

        let start = Instant::now();
        let receipt = provider.send("twilio", &payload()).await;

        // Attempt 1 waits 2s, attempt 2 waits 4s, attempt 3 delivers.
        assert!(receipt.success);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fail_with_detail() {
        let provider = MockProvider::new(
            Script::new([
                SendOutcome::ServerError,
                SendOutcome::ServerError,
                SendOutcome::RateLimited,
            ]),
            RetryPolicy::default(),
        );

        let start = Instant::now();
        let receipt = provider.send("sendgrid", &payload()).await;

        assert!(!receipt.success);
        assert_eq!(
            receipt.error_detail.as_deref(),
            Some("Provider failed after retries")
        );
        // No wait after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn success_on_last_attempt_counts() {
        let provider = MockProvider::new(
            Script::new([
                SendOutcome::RateLimited,
                SendOutcome::ServerError,
                SendOutcome::Delivered,
            ]),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        );
        let receipt = provider.send("twilio", &payload()).await;
        assert!(receipt.success);
    }
}
