use reqwest::Url;
use std::fmt;
use std::time::Duration;

use crate::error::{ErrorCode, FetchError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_JITTER_MS: u64 = 0;
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_CACHE_SIZE: usize = 256;
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("resilient-fetch/", env!("CARGO_PKG_VERSION"));

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_API_BASE_URL: &str = "GITHUB_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "FETCH_MAX_RETRIES";
pub const ENV_BASE_DELAY_MS: &str = "FETCH_BASE_DELAY_MS";

#[derive(Clone)]
pub struct FetcherOptions {
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Attempts per request, including the first. Default: 3
    pub max_retries: u32,
    /// Base of the exponential backoff. Default: 1000
    pub base_delay_ms: u64,
    /// Upper bound for exponential waits. Default: 60s
    pub max_delay: Duration,
    /// Upper bound for `Retry-After` waits. Default: none, the server's value is used as given
    pub max_retry_after: Option<Duration>,
    /// Random 0..jitter_ms added to exponential waits. Default: 0
    pub jitter_ms: u64,
    /// Minimum spacing between requests for distinct resources. Default: none
    pub pacing: Option<Duration>,
    /// TTL of the response cache. `None` disables caching.
    pub cache_ttl: Option<Duration>,
    pub max_cache_size: usize,
    pub user_agent: String,
    pub api_base_url: String,
    /// Sent as a bearer token to URLs under `api_base_url` only.
    pub github_token: Option<String>,
}

impl fmt::Debug for FetcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherOptions")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay", &self.max_delay)
            .field("max_retry_after", &self.max_retry_after)
            .field("jitter_ms", &self.jitter_ms)
            .field("pacing", &self.pacing)
            .field("cache_ttl", &self.cache_ttl)
            .field("max_cache_size", &self.max_cache_size)
            .field("user_agent", &self.user_agent)
            .field("api_base_url", &self.api_base_url)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay: DEFAULT_MAX_DELAY,
            max_retry_after: None,
            jitter_ms: DEFAULT_JITTER_MS,
            pacing: None,
            cache_ttl: None,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            github_token: None,
        }
    }
}

impl FetcherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FetcherOptionsBuilder {
        FetcherOptionsBuilder::new()
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the known keys.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut options = Self::default();

        if let Some(token) = get(ENV_GITHUB_TOKEN) {
            options.github_token = Some(token);
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            options.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            options.timeout = Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &secs)?);
        }
        if let Some(retries) = get(ENV_MAX_RETRIES) {
            options.max_retries = parse_number(ENV_MAX_RETRIES, &retries)?;
        }
        if let Some(delay) = get(ENV_BASE_DELAY_MS) {
            options.base_delay_ms = parse_number(ENV_BASE_DELAY_MS, &delay)?;
        }

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidTimeout,
                "Timeout must be positive",
            ));
        }

        if self.max_retries == 0 {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidRetries,
                "max_retries must be at least 1",
            ));
        }

        if self.base_delay_ms == 0 || self.max_delay.is_zero() {
            return Err(FetchError::config_error(
                ErrorCode::ConfigInvalidDelay,
                "Backoff delays must be positive",
            ));
        }

        match Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(FetchError::config_error(
                    ErrorCode::ConfigInvalidUrl,
                    format!("Invalid API base URL '{}'", self.api_base_url),
                ))
            }
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        FetchError::config_error(
            ErrorCode::ConfigInvalidValue,
            format!("{} must be a non-negative integer, got '{}'", key, value),
        )
    })
}

pub struct FetcherOptionsBuilder {
    options: FetcherOptions,
}

impl Default for FetcherOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FetcherOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: FetcherOptions::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    pub fn base_delay_ms(mut self, delay: u64) -> Self {
        self.options.base_delay_ms = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.options.max_delay = delay;
        self
    }

    pub fn max_retry_after(mut self, limit: Duration) -> Self {
        self.options.max_retry_after = Some(limit);
        self
    }

    pub fn jitter_ms(mut self, jitter: u64) -> Self {
        self.options.jitter_ms = jitter;
        self
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.options.pacing = Some(pacing);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.options.cache_ttl = Some(ttl);
        self
    }

    pub fn max_cache_size(mut self, size: usize) -> Self {
        self.options.max_cache_size = size;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn github_token(mut self, token: impl Into<String>) -> Self {
        self.options.github_token = Some(token.into());
        self
    }

    pub fn build(self) -> FetcherOptions {
        self.options
    }
}
