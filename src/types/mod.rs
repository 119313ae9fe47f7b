use reqwest::Url;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

use crate::error::{ErrorCode, FetchError, Result};

/// Content type reported when the server does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A single GET of one external resource.
///
/// Requests are immutable once built; use [`FetchRequest::builder`] to
/// construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    max_retries: u32,
    base_delay_ms: u64,
}

impl FetchRequest {
    pub fn builder(url: impl Into<String>) -> FetchRequestBuilder {
        FetchRequestBuilder::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Total number of attempts allowed, including the first one.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

pub struct FetchRequestBuilder {
    url: String,
    max_retries: u32,
    base_delay_ms: u64,
}

impl FetchRequestBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_retries: crate::core::DEFAULT_MAX_RETRIES,
            base_delay_ms: crate::core::DEFAULT_BASE_DELAY_MS,
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn build(self) -> Result<FetchRequest> {
        let url = Url::parse(&self.url).map_err(|e| {
            FetchError::with_source(
                ErrorCode::ConfigInvalidUrl,
                format!("Invalid URL '{}'", self.url),
                e,
            )
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidUrl,
                format!("Unsupported URL scheme '{}'", url.scheme()),
            ));
        }

        if self.max_retries == 0 {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidRetries,
                "max_retries must be at least 1",
            ));
        }

        if self.base_delay_ms == 0 {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidDelay,
                "base_delay_ms must be positive",
            ));
        }

        Ok(FetchRequest {
            url: self.url,
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
        })
    }
}

/// Why a fetch gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// 403 or 429 on every allowed attempt.
    RateLimited,
    /// A non-2xx status that is not worth retrying.
    HttpError,
    /// DNS, connect, timeout or other transport failure on the last attempt.
    NetworkError,
}

impl FailureReason {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            FailureReason::RateLimited => ErrorCode::HttpRateLimited,
            FailureReason::HttpError => ErrorCode::HttpStatus,
            FailureReason::NetworkError => ErrorCode::NetworkError,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::RateLimited => "rate limited",
            FailureReason::HttpError => "http error",
            FailureReason::NetworkError => "network error",
        };
        f.write_str(label)
    }
}

/// A successfully fetched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub body: Vec<u8>,
    pub content_type: String,
    /// Attempts made for this call. Zero when served from the cache.
    pub attempts: u32,
    pub from_cache: bool,
}

impl FetchedResource {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            FetchError::with_source(
                ErrorCode::HttpInvalidResponse,
                format!("Failed to parse response: {}", e),
                e,
            )
        })
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub reason: FailureReason,
    pub attempts: u32,
    /// Status of the final attempt. `None` when that attempt got no response.
    pub last_status: Option<u16>,
    /// Human-readable detail, already sanitized.
    pub message: String,
}

impl FetchFailure {
    pub fn into_error(self) -> FetchError {
        let error = FetchError::new(
            self.reason.error_code(),
            format!("{} after {} attempt(s): {}", self.reason, self.attempts, self.message),
        );
        match self.last_status {
            Some(status) => error.with_status(status),
            None => error,
        }
    }
}

/// Result of [`ResilientFetcher::fetch`](crate::ResilientFetcher::fetch).
///
/// Expected failure modes are values, not errors; use
/// [`FetchOutcome::into_result`] when a failure should propagate with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(FetchedResource),
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Success(resource) => resource.attempts,
            FetchOutcome::Failure(failure) => failure.attempts,
        }
    }

    pub fn success(&self) -> Option<&FetchedResource> {
        match self {
            FetchOutcome::Success(resource) => Some(resource),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<FetchedResource> {
        match self {
            FetchOutcome::Success(resource) => Ok(resource),
            FetchOutcome::Failure(failure) => Err(failure.into_error()),
        }
    }
}
