mod client;
mod pacing;
pub mod retry;
mod transport;

pub use client::ResilientFetcher;
pub use pacing::Pacer;
pub use retry::{
    is_rate_limit_status, parse_retry_after, Observation, RetryConfig, RetryConfigBuilder, Step,
};
pub use transport::{BoxFuture, HttpResponse, ReqwestTransport, Transport};
