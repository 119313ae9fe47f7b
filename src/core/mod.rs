mod cache;
mod config;

pub use cache::{Cache, CachedResponse, NoCache, ResponseCache, TtlResponseCache};
pub use config::{
    FetcherOptions, FetcherOptionsBuilder, DEFAULT_API_BASE_URL, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_BASE_DELAY_MS, DEFAULT_JITTER_MS, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES, DEFAULT_PACING, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ENV_API_BASE_URL,
    ENV_BASE_DELAY_MS, ENV_GITHUB_TOKEN, ENV_MAX_RETRIES, ENV_TIMEOUT_SECS,
};
