use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::core::FetcherOptions;
use crate::error::{sanitize_message, ErrorCode, FetchError, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Status, headers and body of one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET. Retrying is the fetcher's job, not the transport's.
///
/// Errors are transport-level only (DNS, connect, timeout, body read); any
/// HTTP status, including 4xx and 5xx, is an `Ok` response.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse>>;
}

/// [`Transport`] backed by a shared `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
    api_base_url: String,
    github_token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(options: &FetcherOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| {
                FetchError::with_source(ErrorCode::ConfigClientBuild, "Failed to create HTTP client", e)
            })?;

        Ok(Self {
            client,
            api_base_url: options.api_base_url.clone(),
            github_token: options.github_token.clone(),
        })
    }

    /// The token only goes to the API host, never to avatar or CDN URLs.
    fn authorization_for(&self, url: &str) -> Option<String> {
        let token = self.github_token.as_ref()?;
        let rest = url.strip_prefix(&self.api_base_url)?;
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            Some(format!("Bearer {}", token))
        } else {
            None
        }
    }

    async fn do_get(&self, url: &str) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(auth) = self.authorization_for(url) {
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(convert_error)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            FetchError::with_source(
                ErrorCode::NetworkError,
                sanitize_message(&format!("Failed to read response body: {}", e)),
                e,
            )
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse>> {
        Box::pin(self.do_get(url))
    }
}

fn convert_error(error: reqwest::Error) -> FetchError {
    let message = sanitize_message(&error.to_string());
    if error.is_timeout() {
        FetchError::with_source(ErrorCode::NetworkTimeout, format!("Request timed out: {}", message), error)
    } else if error.is_connect() {
        FetchError::with_source(ErrorCode::NetworkError, format!("Connection failed: {}", message), error)
    } else {
        FetchError::with_source(ErrorCode::NetworkError, message, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_headers() {
        let response = HttpResponse::new(403)
            .with_header("Retry-After", "2")
            .with_header("Content-Type", "application/json")
            .with_body("{}");

        assert_eq!(response.retry_after(), Some("2"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("retry-after"), Some("2"));
        assert!(!response.is_success());
        assert_eq!(response.body, b"{}");
    }

    #[test]
    fn test_invalid_header_ignored() {
        let response = HttpResponse::new(200).with_header("bad header", "x");
        assert!(response.headers.is_empty());
        assert!(response.is_success());
    }

    #[test]
    fn test_token_scoped_to_api_host() {
        let options = FetcherOptions::builder()
            .api_base_url("https://api.github.com")
            .github_token("ghp_example")
            .build();
        let transport = ReqwestTransport::new(&options).unwrap();

        assert_eq!(
            transport.authorization_for("https://api.github.com/repos/x/y"),
            Some("Bearer ghp_example".to_string())
        );
        assert_eq!(
            transport.authorization_for("https://avatars.githubusercontent.com/u/1?v=4"),
            None
        );
        assert_eq!(
            transport.authorization_for("https://api.github.com.example.net/repos/x/y"),
            None
        );
    }

    #[test]
    fn test_no_token_no_authorization() {
        let transport = ReqwestTransport::new(&FetcherOptions::default()).unwrap();
        assert!(transport
            .authorization_for("https://api.github.com/repos/x/y")
            .is_none());
    }
}
