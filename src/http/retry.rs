//! Retry policy: exponential backoff with a server-directed override.
//!
//! Each attempt is reduced to an [`Observation`] and handed to
//! [`RetryConfig::next_step`], which decides whether the fetch succeeds,
//! backs off and tries again, or gives up. Keeping the decision a pure
//! function of (attempt, budget, observation) is what lets the fetch loop
//! stay a flat loop with an explicit counter.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::core::{FetcherOptions, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_JITTER_MS, DEFAULT_MAX_DELAY};
use crate::types::FailureReason;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Cap on exponential waits. Default: 60s
    pub max_delay: Duration,

    /// Cap on server-directed `Retry-After` waits. Default: none
    pub max_retry_after: Option<Duration>,

    /// Backoff multiplier. Default: 2.0
    pub backoff_multiplier: f64,

    /// Maximum jitter in milliseconds (random 0-jitter added). Default: 0
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_delay: DEFAULT_MAX_DELAY,
            max_retry_after: None,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ms: DEFAULT_JITTER_MS,
        }
    }
}

impl From<&FetcherOptions> for RetryConfig {
    fn from(options: &FetcherOptions) -> Self {
        Self {
            max_delay: options.max_delay,
            max_retry_after: options.max_retry_after,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ms: options.jitter_ms,
        }
    }
}

/// What a single attempt produced, as far as the retry policy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation<'a> {
    Response {
        status: u16,
        retry_after: Option<&'a str>,
    },
    TransportFailure,
}

/// The policy's verdict for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Retry(Duration),
    Fail(FailureReason),
}

/// 403 is how GitHub signals an exhausted quota; 429 is the standard code.
pub fn is_rate_limit_status(status: u16) -> bool {
    status == 403 || status == 429
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Backoff for a zero-based attempt: `base * multiplier^attempt`, capped,
    /// plus jitter.
    pub fn calculate_delay(&self, base_delay_ms: u64, attempt: u32) -> Duration {
        let exponential =
            base_delay_ms as f64 * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);

        let capped = exponential.min(self.max_delay.as_millis() as f64);

        let jitter = if self.jitter_ms > 0 {
            rand::random::<f64>() * self.jitter_ms as f64
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter) as u64)
    }

    /// Decide what happens after `attempt` (zero-based) given `max_retries`
    /// total attempts.
    pub fn next_step(
        &self,
        attempt: u32,
        max_retries: u32,
        base_delay_ms: u64,
        observation: Observation<'_>,
    ) -> Step {
        let has_budget = attempt.saturating_add(1) < max_retries;

        match observation {
            Observation::Response { status, .. } if (200..300).contains(&status) => Step::Succeed,
            Observation::Response {
                status,
                retry_after,
            } if is_rate_limit_status(status) => {
                if !has_budget {
                    return Step::Fail(FailureReason::RateLimited);
                }
                let delay = retry_after
                    .and_then(|value| parse_retry_after(value, Utc::now()))
                    .map(|delay| match self.max_retry_after {
                        Some(limit) => delay.min(limit),
                        None => delay,
                    })
                    .unwrap_or_else(|| self.calculate_delay(base_delay_ms, attempt));
                Step::Retry(delay)
            }
            Observation::Response { .. } => Step::Fail(FailureReason::HttpError),
            Observation::TransportFailure => {
                if has_budget {
                    Step::Retry(self.calculate_delay(base_delay_ms, attempt))
                } else {
                    Step::Fail(FailureReason::NetworkError)
                }
            }
        }
    }
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP-date.
///
/// Dates in the past yield a zero delay. Anything else is `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Builder for RetryConfig.
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    max_delay: Option<Duration>,
    max_retry_after: Option<Duration>,
    backoff_multiplier: Option<f64>,
    jitter_ms: Option<u64>,
}

impl RetryConfigBuilder {
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn max_retry_after(mut self, limit: Duration) -> Self {
        self.max_retry_after = Some(limit);
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    pub fn jitter_ms(mut self, jitter: u64) -> Self {
        self.jitter_ms = Some(jitter);
        self
    }

    pub fn build(self) -> RetryConfig {
        RetryConfig {
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            max_retry_after: self.max_retry_after,
            backoff_multiplier: self.backoff_multiplier.unwrap_or(DEFAULT_BACKOFF_MULTIPLIER),
            jitter_ms: self.jitter_ms.unwrap_or(DEFAULT_JITTER_MS),
        }
    }
}
