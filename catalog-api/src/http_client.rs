//! HttpClient middleware used by CatalogClient
//!
//! Responsible for
//!  - handing all HTTP api requests
//!  - logging/tracing
//!  - retries and backoff (for timeouts and connection errors)
//!  - rate limiting

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use reqwest::{ClientBuilder, Method, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Result,
    config::{BACKOFF_MAX_MS, RATE_LIMIT_WAIT_MAX_SECS, RATE_LIMIT_WAIT_WARN_SECS},
    paged::{PagedResult, PaginatedResponse},
    prelude::*,
};

/// HTTP metrics tracked using atomic counters for thread-safe access.
/// These counters are cumulative and never reset during the client's lifetime.
#[derive(Debug, Default)]
pub struct HttpMetrics {
    /// Total number of HTTP requests sent to the server
    total_requests: AtomicU64,
    /// Total number of successful responses (2xx status codes)
    successful_responses: AtomicU64,
    /// Total number of error responses (non-2xx status codes, excluding rate limit errors)
    errors: AtomicU64,
    /// Total number of retry attempts (connection failures, timeouts, 5xx errors)
    retries: AtomicU64,
    /// Total bytes received in response bodies
    bytes_received: AtomicU64,
    /// Total number of rate limit errors (429 responses)
    rate_limit_errors: AtomicU64,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of current metrics as plain u64 values
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            rate_limit_errors: self.rate_limit_errors.load(Ordering::Relaxed),
        }
    }

    fn increment_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_success(&self) {
        self.successful_responses.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    fn increment_rate_limit_errors(&self) {
        self.rate_limit_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of HTTP metrics with plain u64 values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpMetricsSnapshot {
    /// Total number of HTTP requests sent to the server
    pub total_requests: u64,
    /// Total number of successful responses (2xx status codes)
    pub successful_responses: u64,
    /// Total number of error responses (non-2xx status codes, excluding rate limit errors)
    pub errors: u64,
    /// Total number of retry attempts
    pub retries: u64,
    /// Total bytes received in response bodies
    pub bytes_received: u64,
    /// Total number of rate limit errors (429 responses)
    pub rate_limit_errors: u64,
}

impl fmt::Display for HttpMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} success={} errors={} retries={} rate_limit={} recv={}",
            self.total_requests,
            self.successful_responses,
            self.errors,
            self.retries,
            self.rate_limit_errors,
            format_bytes(self.bytes_received),
        )
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes}B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// status codes where it's ok to retry and backoff
fn retry_for_status(code: StatusCode) -> bool {
    matches!(
        code,
        StatusCode::REQUEST_TIMEOUT /* 408 */
            | StatusCode::BAD_GATEWAY /* 502 */
            | StatusCode::SERVICE_UNAVAILABLE /* 503 */
            | StatusCode::GATEWAY_TIMEOUT /* 504 */
    )
}

#[derive(Clone, Default)]
pub(crate) struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .finish()
    }
}

impl HttpRequest {
    pub(crate) fn get(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query,
        }
    }

    /// Create a new request with updated pagination parameters.
    /// This replaces any existing skip/limit query parameters.
    pub(crate) fn with_pagination(&self, skip: usize, limit: usize) -> Self {
        let mut new_query: Vec<(String, String)> = self
            .query
            .iter()
            .filter(|(key, _)| key != "skip" && key != "limit")
            .cloned()
            .collect();

        new_query.push(("limit".to_string(), limit.to_string()));
        new_query.push(("skip".to_string(), skip.to_string()));

        HttpRequest {
            method: self.method.clone(),
            path: self.path.clone(),
            query: new_query,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    pub client: reqwest::Client,

    /// Base URL for API requests (e.g., "https://dummyjson.com")
    pub base_url: String,

    limits: ValidationLimits,

    // Max retries for connection failures and retryable status codes
    max_retries: u32,

    /// HTTP request/response metrics
    pub metrics: Arc<HttpMetrics>,
}

struct ParsedRetry {
    header: String,
    duration: Duration,
}

/// Parse rate limit headers from a 429 response to determine retry duration.
/// Accepts `Retry-After` and the `RateLimit-Reset` family, each as seconds to wait.
fn parse_retry_after(headers: &HeaderMap) -> Result<ParsedRetry> {
    for header_name in ["retry-after", "ratelimit-reset", "x-ratelimit-reset"] {
        if let Some(header_value) = headers.get(header_name)
            && let Ok(header) = header_value.to_str()
        {
            if let Ok(secs) = header.trim().parse::<u64>() {
                return Ok(ParsedRetry {
                    duration: Duration::from_secs(secs),
                    header: header.to_string(),
                });
            }
            error!("Could not parse 429 response header '{header_name}: {header}'");
        }
    }

    // couldn't parse header
    Err(CatalogError::RateLimitExceeded {
        header: "Received 429 response but couldn't parse rate limit headers. See logs".to_string(),
        duration: Duration::from_secs(0),
    })
}

impl HttpClient {
    pub fn new(
        builder: ClientBuilder,
        base_url: String,
        limits: ValidationLimits,
        max_retries: u32,
    ) -> Result<Self> {
        let client = builder.build().context(HttpSnafu {
            method: "client-init",
            url: "",
        })?;
        Ok(HttpClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limits,
            max_retries,
            metrics: Arc::new(HttpMetrics::new()),
        })
    }

    /// Returns a snapshot of current HTTP metrics
    pub fn metrics_snapshot(&self) -> HttpMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) async fn get_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        self.send(HttpRequest::get(path, query)).await
    }

    /// This function handles all catalog api requests
    /// - handles 429 rate limit feedback
    /// - retries up to `max_retries` times for connection failures or server timeout
    /// - maps http error codes into `CatalogErrors`
    /// - deserializes json response body into return type T
    pub(crate) async fn send<T: DeserializeOwned>(&self, req: HttpRequest) -> Result<T> {
        // attempt counter is for server busy and connection drop errors
        // counter is reset to 0 whenever we wait based on 429 rate limit response
        let mut attempt = 0u32;
        let mut rate_limit_retries = 0u32;

        // time to wait on next iteration
        let mut retry_wait: Option<Duration> = None;

        // check for excessive request size
        self.limits.validate_query(&req.query)?;

        let full_url = format!("{}{}", self.base_url, req.path);
        let req_builder = self
            .client
            .request(req.method.clone(), &full_url)
            .query(&req.query);

        // debug log (if tracing enabled)
        log_request(&req_builder);

        loop {
            if let Some(wait_time) = retry_wait {
                info!("RateLimit: pausing for {} sec", wait_time.as_secs());
                tokio::time::sleep(wait_time).await;
                retry_wait = None;
                attempt = 0;
            }
            let request = req_builder.try_clone().ok_or_else(|| {
                // try_clone with no body should never return None
                CatalogError::Other {
                    message: "reqwest::RequestBuilder internal error".into(),
                }
            })?;

            self.metrics.increment_requests();

            match request.send().await {
                Ok(response) => {
                    let code = response.status();
                    match code {
                        ok if ok.is_success() => {
                            let body: Bytes = response.bytes().await.context(HttpSnafu {
                                method: req.method.to_string(),
                                url: req.path.clone(),
                            })?;
                            self.metrics.increment_success();
                            self.metrics.add_bytes_received(body.len() as u64);

                            log_response(&req.path, &body);

                            // deserialization failure should not be retried
                            return deserialize_json(&body);
                        }
                        StatusCode::TOO_MANY_REQUESTS /* 429 */ => {
                            self.metrics.increment_rate_limit_errors();
                            rate_limit_retries = rate_limit_retries.saturating_add(1);
                            let ParsedRetry { header, duration } =
                                parse_retry_after(response.headers()).inspect_err(|e| {
                                    error!("{e:?}");
                                })?;
                            if rate_limit_retries > self.max_retries
                                || duration > Duration::from_secs(RATE_LIMIT_WAIT_MAX_SECS)
                            {
                                error!(
                                    rate_limit_retries,
                                    ?req,
                                    "http 429 Rate-limit backoff={}s, giving up",
                                    duration.as_secs()
                                );
                                return Err(CatalogError::RateLimitExceeded { header, duration });
                            }
                            if duration > Duration::from_secs(RATE_LIMIT_WAIT_WARN_SECS) {
                                warn!(
                                    rate_limit_retries,
                                    "http 429 Rate-limit backoff={}s",
                                    duration.as_secs()
                                );
                            }
                            self.metrics.increment_retries();
                            retry_wait = Some(duration.max(Duration::from_millis(100)));
                        }
                        StatusCode::BAD_REQUEST /* 400 */ => {
                            self.metrics.increment_errors();
                            let message = response.text().await.unwrap_or_else(|_| "BadRequest".into());
                            error!(?code, ?message, ?req, "http");
                            return Err(CatalogError::Validation { message });
                        }
                        StatusCode::NOT_FOUND /* 404 */ | StatusCode::GONE /* 410 */ => {
                            self.metrics.increment_errors();
                            let message = response.text().await.unwrap_or_else(|_| "NotFound".into());
                            debug!(?code, ?message, ?req, "http");
                            return Err(CatalogError::NotFound {
                                // too generic here - callers with more context rewrite this
                                obj_type: "Resource".into(),
                                key: req.path,
                            });
                        }
                        _ => {
                            let message = response.text().await.unwrap_or_default();
                            error!(?code, ?req, message, attempt, "http");
                            self.metrics.increment_errors();
                            if retry_for_status(code) && is_idempotent_method(&req.method) {
                                if attempt < self.max_retries {
                                    log_and_backoff(attempt, code.to_string()).await;
                                    self.metrics.increment_retries();
                                    attempt += 1;
                                    continue;
                                }
                                return Err(CatalogError::TooManyRetries { n: attempt + 1 });
                            }
                            return Err(CatalogError::ApiError {
                                code: code.as_u16(),
                                method: req.method.to_string(),
                                url: req.path,
                                message,
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(source=?e, ?req, "http");
                    // Check for connection or timeout errors
                    if (e.is_connect() || e.is_timeout())
                        && is_idempotent_method(&req.method)
                        && attempt < self.max_retries
                    {
                        log_and_backoff(attempt, e.to_string()).await;
                        self.metrics.increment_retries();
                        attempt += 1;
                        continue;
                    }
                    // Other non-recoverable errors (e.g., DNS error, invalid URL, etc.)
                    self.metrics.increment_errors();
                    return Err(CatalogError::Http {
                        method: req.method.to_string(),
                        url: req.path,
                        source: e,
                    });
                }
            }
        }
    }
}

// The purpose of this trait is to define methods for Arc<HttpClient>
pub(crate) trait GetPaged {
    async fn get_request_paged<T: DeserializeOwned + Send + 'static>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<PagedResult<T>>;
}

impl GetPaged for Arc<HttpClient> {
    /// Makes a GET request that returns a `PagedResult` for pagination support.
    async fn get_request_paged<T: DeserializeOwned + Send + 'static>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<PagedResult<T>> {
        let req = HttpRequest::get(path, query);
        let response: PaginatedResponse<T> = self.send(req.clone()).await?;
        Ok(PagedResult::new(response, self.clone(), req))
    }
}

// dump request
// requires RUST_LOG=catalog::http_json=trace
fn log_request(builder: &reqwest::RequestBuilder) {
    if tracing::enabled!(target: "catalog::http_json", tracing::Level::TRACE)
        && let Some(req) = builder.try_clone().and_then(|b| b.build().ok())
    {
        let method = req.method().as_str();
        let url = req.url();
        trace!(target: "catalog::http_json", "{method} url={url}");
    }
}

// dump json response, for debugging
fn log_response(path: &str, body: &Bytes) {
    if tracing::enabled!(target: "catalog::http_json", tracing::Level::TRACE) {
        trace!(target: "catalog::http_json", "Response path={path} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// detailed json path to the error
pub(crate) fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            let path = err.path().to_string();
            error!("Deserialization failed at {path}: {err}");
            Err(CatalogError::Deserialization {
                path,
                source: err.into_inner(),
            })
        }
    }
}

// 250ms, 500ms, 1s, ... capped at BACKOFF_MAX_MS
fn backoff_base_ms(attempt: u32) -> u64 {
    2u64.saturating_pow(attempt)
        .saturating_mul(250)
        .min(BACKOFF_MAX_MS)
}

// log attempt and sleep for exponential backoff
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
async fn log_and_backoff(attempt: u32, err: String) {
    let base_delay = backoff_base_ms(attempt);
    let jitter = f64::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    ) / 1_000_000_000.0;
    let delay = ((base_delay as f64) * (0.5 + jitter)).round() as u64;
    let delay = delay.max(1);
    warn!("Recoverable error {err}. Attempt {attempt}. Waiting {delay}ms before retry");
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

fn is_idempotent_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

#[cfg(test)]
mod tests {
    use super::{HttpRequest, backoff_base_ms, parse_retry_after};
    use crate::config::BACKOFF_MAX_MS;
    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_retry_for_status() {
        assert!(super::retry_for_status(StatusCode::REQUEST_TIMEOUT));
        assert!(super::retry_for_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(super::retry_for_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!super::retry_for_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!super::retry_for_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_base_ms(0), 250);
        assert_eq!(backoff_base_ms(2), 1000);
        assert_eq!(backoff_base_ms(7), BACKOFF_MAX_MS);
        assert_eq!(backoff_base_ms(56), BACKOFF_MAX_MS);
        assert_eq!(backoff_base_ms(u32::MAX), BACKOFF_MAX_MS);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        let parsed = parse_retry_after(&headers).expect("parse retry header");
        assert_eq!(parsed.duration.as_secs(), 3);
        assert_eq!(parsed.header, "3");
    }

    #[test]
    fn test_parse_retry_after_ratelimit_reset() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-reset", HeaderValue::from_static("10"));
        let parsed = parse_retry_after(&headers).expect("parse retry header");
        assert_eq!(parsed.duration.as_secs(), 10);
    }

    #[test]
    fn test_parse_retry_after_missing() {
        assert!(parse_retry_after(&HeaderMap::new()).is_err());
    }

    #[test]
    fn with_pagination_replaces_cursor_params() {
        let req = HttpRequest::get(
            "/products",
            vec![
                ("sortBy".to_string(), "title".to_string()),
                ("skip".to_string(), "0".to_string()),
                ("limit".to_string(), "10".to_string()),
            ],
        );
        let next = req.with_pagination(20, 10);
        assert_eq!(
            next.query,
            vec![
                ("sortBy".to_string(), "title".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("skip".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn metrics_display_formats_bytes() {
        let snapshot = super::HttpMetricsSnapshot {
            total_requests: 2,
            successful_responses: 2,
            bytes_received: 2048,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("requests=2"));
        assert!(text.contains("recv=2.0KB"));
    }
}
