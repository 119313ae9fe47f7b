//! Resilient fetcher
//!
//! HTTP GET with retry, exponential backoff and `Retry-After` support, plus
//! the build-time jobs that cache GitHub stats and technology logos for the
//! homelab documentation site.
//!
//! # Quick Start
//!
//! ```no_run
//! use resilient_fetch::{FetchOutcome, FetchRequest, FetcherOptions, ResilientFetcher};
//!
//! #[tokio::main]
//! async fn main() -> resilient_fetch::Result<()> {
//!     let fetcher = ResilientFetcher::new(FetcherOptions::from_env()?)?;
//!
//!     let request = FetchRequest::builder("https://api.github.com/repos/theepicsaxguy/homelab")
//!         .max_retries(3)
//!         .base_delay_ms(1000)
//!         .build()?;
//!
//!     match fetcher.fetch(&request).await {
//!         FetchOutcome::Success(resource) => println!("{} bytes", resource.body.len()),
//!         FetchOutcome::Failure(failure) => eprintln!("gave up: {:?}", failure.reason),
//!     }
//!
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod core;
pub mod error;
pub mod github;
pub mod http;
pub mod site;
pub mod types;
pub mod utils;

// Re-exports from types module
pub use types::{
    FailureReason, FetchFailure, FetchOutcome, FetchRequest, FetchRequestBuilder,
    FetchedResource, DEFAULT_CONTENT_TYPE,
};

// Re-exports from error module
pub use error::{ErrorCode, FetchError, Result};

// Re-exports from core module
pub use self::core::{
    Cache, CachedResponse, FetcherOptions, FetcherOptionsBuilder, NoCache, ResponseCache,
    TtlResponseCache,
};

// Re-exports from http module
pub use http::{HttpResponse, Pacer, ReqwestTransport, ResilientFetcher, RetryConfig, Transport};

// Re-exports from github and site modules
pub use github::{AvatarSource, GithubClient, RepoStats};
pub use site::{LogoJob, LogoReport, LogoTarget, StatsJob};
