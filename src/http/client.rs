use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::sleep;

use super::pacing::Pacer;
use super::retry::{Observation, RetryConfig, Step};
use super::transport::{HttpResponse, ReqwestTransport, Transport};
use crate::core::{CachedResponse, FetcherOptions, NoCache, ResponseCache, TtlResponseCache};
use crate::error::{sanitize_message, Result};
use crate::types::{
    FailureReason, FetchFailure, FetchOutcome, FetchRequest, FetchedResource, DEFAULT_CONTENT_TYPE,
};

/// Longest slice of an error body kept in a failure message.
const ERROR_BODY_EXCERPT: usize = 200;

/// HTTP GET with retry, backoff, optional pacing and an injectable cache.
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn ResponseCache>,
    pacer: Option<Pacer>,
    retry: RetryConfig,
    options: FetcherOptions,
}

impl ResilientFetcher {
    /// Build a fetcher backed by `reqwest`.
    pub fn new(options: FetcherOptions) -> Result<Self> {
        options.validate()?;
        let transport = ReqwestTransport::new(&options)?;
        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    /// Build a fetcher over any transport. Options are not validated here.
    pub fn with_transport(options: FetcherOptions, transport: Arc<dyn Transport>) -> Self {
        let cache: Arc<dyn ResponseCache> = match options.cache_ttl {
            Some(ttl) => Arc::new(TtlResponseCache::new(options.max_cache_size, ttl)),
            None => Arc::new(NoCache),
        };

        Self {
            transport,
            cache,
            pacer: options.pacing.filter(|p| !p.is_zero()).map(Pacer::new),
            retry: RetryConfig::from(&options),
            options,
        }
    }

    /// Replace the response cache.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the retry policy derived from the options.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    /// A request for `url` carrying this fetcher's retry defaults.
    pub fn request(&self, url: impl Into<String>) -> Result<FetchRequest> {
        FetchRequest::builder(url)
            .max_retries(self.options.max_retries)
            .base_delay_ms(self.options.base_delay_ms)
            .build()
    }

    /// Fetch one resource.
    ///
    /// Returns only once the request has succeeded or the retry budget is
    /// spent; rate limiting and HTTP errors come back as
    /// [`FetchOutcome::Failure`], never as a panic or an `Err`.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let url = request.url();

        if let Some(cached) = self.cache.get(url) {
            tracing::debug!("Cache hit for {}", url);
            return FetchOutcome::Success(FetchedResource {
                body: cached.body,
                content_type: cached.content_type,
                attempts: 0,
                from_cache: true,
            });
        }

        let mut attempt: u32 = 0;
        let mut last_status: Option<u16> = None;

        loop {
            if let Some(pacer) = &self.pacer {
                pacer.wait_turn(url).await;
            }

            let result = self.transport.get(url).await;

            let (observation, detail) = match &result {
                Ok(response) => {
                    last_status = Some(response.status);
                    (
                        Observation::Response {
                            status: response.status,
                            retry_after: response.retry_after(),
                        },
                        if response.is_success() {
                            String::new()
                        } else {
                            describe_status(response)
                        },
                    )
                }
                Err(error) => {
                    last_status = None;
                    (Observation::TransportFailure, error.message.clone())
                }
            };

            let step = self.retry.next_step(
                attempt,
                request.max_retries(),
                request.base_delay_ms(),
                observation,
            );

            let response = match (step, result) {
                (Step::Succeed, Ok(response)) => response,
                (Step::Retry(delay), _) => {
                    tracing::debug!(
                        "Retry attempt {} of {} for {} ({}), waiting {:?}",
                        attempt + 1,
                        request.max_retries(),
                        url,
                        detail,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                (Step::Fail(reason), _) => {
                    return fail(url, reason, attempt + 1, last_status, detail);
                }
                // A transport error never classifies as success
                (Step::Succeed, Err(_)) => {
                    return fail(url, FailureReason::NetworkError, attempt + 1, last_status, detail);
                }
            };

            let resource = into_resource(response, attempt + 1);
            tracing::debug!("Fetched {} in {} attempt(s)", url, resource.attempts);
            self.cache.put(
                url,
                CachedResponse {
                    body: resource.body.clone(),
                    content_type: resource.content_type.clone(),
                },
            );
            return FetchOutcome::Success(resource);
        }
    }

    /// Fetch and decode a JSON body. Decode failures are not retried.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &FetchRequest) -> Result<T> {
        self.fetch(request).await.into_result()?.json()
    }

    /// Fetch independent resources concurrently; outcomes keep request order.
    pub async fn fetch_all(&self, requests: &[FetchRequest]) -> Vec<FetchOutcome> {
        join_all(requests.iter().map(|request| self.fetch(request))).await
    }
}

fn fail(
    url: &str,
    reason: FailureReason,
    attempts: u32,
    last_status: Option<u16>,
    detail: String,
) -> FetchOutcome {
    match reason {
        FailureReason::HttpError => tracing::debug!("Giving up on {}: {}", url, detail),
        _ => tracing::warn!(
            "Giving up on {} after {} attempt(s): {}",
            url,
            attempts,
            detail
        ),
    }

    FetchOutcome::Failure(FetchFailure {
        reason,
        attempts,
        last_status,
        message: detail,
    })
}

fn into_resource(response: HttpResponse, attempts: u32) -> FetchedResource {
    let content_type = response
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    FetchedResource {
        body: response.body,
        content_type,
        attempts,
        from_cache: false,
    }
}

fn describe_status(response: &HttpResponse) -> String {
    let head = &response.body[..response.body.len().min(ERROR_BODY_EXCERPT * 4)];
    let excerpt: String = String::from_utf8_lossy(head)
        .chars()
        .take(ERROR_BODY_EXCERPT)
        .collect();
    let excerpt = excerpt.trim();

    if excerpt.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        sanitize_message(&format!("HTTP {} - {}", response.status, excerpt))
    }
}
