#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use resilient_fetch::http::BoxFuture;
use resilient_fetch::{ErrorCode, FetchError, FetcherOptions, HttpResponse, ResilientFetcher, Transport};

/// Replays a fixed list of responses and counts calls.
///
/// Once the script runs out, every further call is a network error.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
    calls: AtomicU32,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpResponse, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, resilient_fetch::Result<HttpResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
        let next = self.script.lock().pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| Err(network_error()))
        })
    }
}

pub fn ok(body: &str) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse::new(200)
        .with_header("content-type", "application/json")
        .with_body(body))
}

pub fn status(code: u16) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse::new(code))
}

pub fn rate_limited(retry_after: &str) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse::new(403).with_header("retry-after", retry_after))
}

pub fn network_error() -> FetchError {
    FetchError::new(ErrorCode::NetworkError, "Connection failed: connection refused")
}

pub fn fetcher(transport: Arc<ScriptedTransport>) -> ResilientFetcher {
    fetcher_with(FetcherOptions::default(), transport)
}

pub fn fetcher_with(options: FetcherOptions, transport: Arc<ScriptedTransport>) -> ResilientFetcher {
    ResilientFetcher::with_transport(options, transport)
}
