use anyhow::{Context, Result};
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry schedule for provider calls: exponential backoff plus jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    /// Jitter is up to `delay / jitter_divisor`
    pub jitter_divisor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            jitter_divisor: 4,
        }
    }
}

impl RetryPolicy {
    /// No retries at all; used by callers that must fail fast.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), without jitter.
    pub fn base_delay_for(&self, attempt: usize) -> Duration {
        let multiplier = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let delay = self.base_delay_for(attempt);
        let max_jitter_ms = delay.as_millis() / u128::from(self.jitter_divisor.max(1));
        if max_jitter_ms == 0 {
            return delay;
        }

        let max_jitter_ms = u64::try_from(max_jitter_ms).unwrap_or(u64::MAX);
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter_ms))
    }
}

pub(super) fn is_retriable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retriable_send_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Send a request built by `make_request`, retrying transient failures.
///
/// A non-success response that is not retriable (or out of retries) is
/// returned as-is so the caller can read the provider's error body.
pub(super) async fn send_with_retry(
    policy: RetryPolicy,
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let mut attempt = 0;

    loop {
        let can_retry = attempt < policy.max_retries;

        match make_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || !(can_retry && is_retriable_status(status)) {
                    return Ok(response);
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    "Provider returned {}; retrying in {:?} (attempt {}/{})",
                    status,
                    delay,
                    attempt + 1,
                    policy.max_retries + 1
                );
                let _ = response.bytes().await;
                sleep(delay).await;
            }
            Err(err) if can_retry && is_retriable_send_error(&err) => {
                let delay = policy.delay_for(attempt);
                debug!(
                    "Provider request error: {}; retrying in {:?} (attempt {}/{})",
                    err,
                    delay,
                    attempt + 1,
                    policy.max_retries + 1
                );
                sleep(delay).await;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)).with_context(|| {
                    format!("Provider request failed after {} attempt(s)", attempt + 1)
                });
            }
        }

        attempt += 1;
    }
}
