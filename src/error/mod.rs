use thiserror::Error;

pub mod sanitizer;

pub use sanitizer::sanitize_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Network errors
    NetworkError,
    NetworkTimeout,

    // HTTP errors
    HttpRateLimited,
    HttpStatus,
    HttpInvalidResponse,
    HttpEmptyBody,

    // Configuration errors
    ConfigInvalidUrl,
    ConfigInvalidRetries,
    ConfigInvalidDelay,
    ConfigInvalidTimeout,
    ConfigInvalidRepository,
    ConfigInvalidValue,
    ConfigClientBuild,

    // Filesystem errors
    IoWriteError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ErrorCode::HttpRateLimited => "HTTP_RATE_LIMITED",
            ErrorCode::HttpStatus => "HTTP_STATUS",
            ErrorCode::HttpInvalidResponse => "HTTP_INVALID_RESPONSE",
            ErrorCode::HttpEmptyBody => "HTTP_EMPTY_BODY",
            ErrorCode::ConfigInvalidUrl => "CONFIG_INVALID_URL",
            ErrorCode::ConfigInvalidRetries => "CONFIG_INVALID_RETRIES",
            ErrorCode::ConfigInvalidDelay => "CONFIG_INVALID_DELAY",
            ErrorCode::ConfigInvalidTimeout => "CONFIG_INVALID_TIMEOUT",
            ErrorCode::ConfigInvalidRepository => "CONFIG_INVALID_REPOSITORY",
            ErrorCode::ConfigInvalidValue => "CONFIG_INVALID_VALUE",
            ErrorCode::ConfigClientBuild => "CONFIG_CLIENT_BUILD",
            ErrorCode::IoWriteError => "IO_WRITE_ERROR",
        }
    }

    /// Whether a later run could succeed without any change on the caller's side.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError | ErrorCode::NetworkTimeout | ErrorCode::HttpRateLimited
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("[{code}] {message}")]
pub struct FetchError {
    pub code: ErrorCode,
    pub message: String,
    /// HTTP status of the last response seen, when there was one.
    pub status: Option<u16>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FetchError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach the HTTP status that produced this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn config_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn io_error(code: ErrorCode, message: impl Into<String>, source: std::io::Error) -> Self {
        Self::with_source(code, message, source)
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConfigInvalidUrl
                | ErrorCode::ConfigInvalidRetries
                | ErrorCode::ConfigInvalidDelay
                | ErrorCode::ConfigInvalidTimeout
                | ErrorCode::ConfigInvalidRepository
                | ErrorCode::ConfigInvalidValue
                | ErrorCode::ConfigClientBuild
        )
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
