use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Config;

/// Anything that can turn a URL into HTML the link extractor can read.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;

    /// Short name recorded in the taxonomy metadata
    fn name(&self) -> &'static str;
}

/// HTTP client for making web requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout_duration: Duration,
    user_agent: String,
    max_content_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with the default content size limit
    pub fn new(user_agent: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Self::with_content_limit(user_agent, timeout_secs, Config::MAX_CONTENT_SIZE)
    }

    /// Create a new HTTP client with custom content size limit
    pub fn with_content_limit(
        user_agent: String,
        timeout_secs: u64,
        max_content_size: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(Config::MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::NetworkError(format!("client setup failed: {}", e)))?;

        Ok(Self {
            client,
            timeout_duration: Duration::from_secs(timeout_secs),
            user_agent,
            max_content_size,
        })
    }

    /// Get the user agent string used by this client
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a URL and return the response body as a string.
    /// Transient errors are retried with linear backoff.
    pub async fn get(&self, url: &str) -> Result<FetchResult, FetchError> {
        let mut last_error = None;

        for attempt in 0..=Config::MAX_RETRIES {
            // Backoff: 0ms, 500ms, 1000ms
            if attempt > 0 {
                let backoff_ms = Config::RETRY_BACKOFF_MS * attempt as u64;
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }

            match self.fetch_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < Config::MAX_RETRIES => {
                    tracing::debug!(url, attempt, error = %e, "retrying fetch");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(FetchError::NetworkError("Max retries exceeded".to_string())))
    }

    /// Fetch a URL once (internal helper for retry logic)
    async fn fetch_once(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = timeout(
            self.timeout_duration,
            self.client
                .get(url)
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header("Accept-Language", "en-US,en;q=0.5")
                .send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(Self::classify_error)?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(FetchError::Status(status_code));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        if let Some(length) = response.content_length() {
            if length as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(length as usize, self.max_content_size));
            }
        }

        let content = timeout(self.timeout_duration, response.text())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::BodyError(e.to_string()))?;

        if content.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(
                content.len(),
                self.max_content_size,
            ));
        }

        Ok(FetchResult {
            final_url,
            content,
            status_code,
            content_type,
        })
    }

    /// Classify reqwest errors into our FetchError types
    fn classify_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout;
        }

        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("connection refused") {
            return FetchError::ConnectionRefused;
        }
        if error_msg.contains("dns") || error_msg.contains("name resolution") {
            return FetchError::DnsError;
        }
        if error_msg.contains("ssl") || error_msg.contains("tls") || error_msg.contains("certificate") {
            return FetchError::SslError;
        }

        FetchError::NetworkError(error.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        self.get(url).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects
    pub final_url: String,
    pub content: String,
    pub status_code: u16,
    pub content_type: Option<String>,
}

/// Errors that can occur during fetching
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection refused - server not accepting connections")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    DnsError,

    #[error("SSL/TLS error - certificate or encryption issue")]
    SslError,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    BodyError(String),

    #[error("Content too large: {0} bytes (max: {1} bytes)")]
    ContentTooLarge(usize, usize),

    #[error("Browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Check if this error is retryable (transient) or permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::NetworkError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("broken pipe")
                    || msg_lower.contains("connection reset")
                    || msg_lower.contains("temporary")
            }
            FetchError::ConnectionRefused
            | FetchError::DnsError
            | FetchError::SslError
            | FetchError::BodyError(_)
            | FetchError::ContentTooLarge(_, _)
            | FetchError::Browser(_) => false,
        }
    }
}
