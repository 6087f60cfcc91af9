//! Catalog api client
//!
//! # Creating new api client
//!
//! - [new](CatalogClient::new) - create new client
//! - [with_config](CatalogClient::with_config) - create client with custom configuration
//! - [with_client](CatalogClient::with_client) - create client with configuration and custom reqwest client
//!
//! # Configuration
//!
//! - [get_config](CatalogClient::get_config) - returns configuration
//! - [http_metrics](CatalogClient::http_metrics) - returns request counters
//!

use std::sync::Arc;

use tracing::debug;

use crate::{
    CATALOG_DEFAULT_URL, DEFAULT_PAGE_SIZE, Result,
    config::{CATALOG_MAX_RETRIES_ENV, CATALOG_URL_ENV, MAX_RETRIES_DEFAULT},
    http_client::HttpClient,
    prelude::*,
};

/// Configuration for the catalog client. Defines endpoint url, page size, and validation limits.
///
/// ```rust,no_run
/// use catalog::prelude::*;
/// # fn create_client() -> Result<CatalogClient, CatalogError> {
/// let config = ClientConfig::default()
///     .base_url("http://127.0.0.1:8080")
///     .page_size(25);
/// let client = CatalogClient::with_config(config)?;
/// # Ok(client)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url for all api requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable CATALOG_URL, if defined, or
    /// * "https://dummyjson.com" `catalog::CATALOG_DEFAULT_URL`
    pub base_url: String,

    /// Rows requested per list page.
    pub page_size: u32,

    /// Limits for sanity checking.
    pub limits: ValidationLimits,

    /// Maximum retries for connection failures, retryable status codes, and 429 responses.
    ///
    /// Defaults to MAX_RETRIES_DEFAULT, or the env override if set: CATALOG_MAX_RETRIES.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(CATALOG_URL_ENV).unwrap_or(CATALOG_DEFAULT_URL.to_string()),
            page_size: DEFAULT_PAGE_SIZE,
            limits: Default::default(),
            max_retries: std::env::var(CATALOG_MAX_RETRIES_ENV)
                .ok()
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(MAX_RETRIES_DEFAULT),
        }
    }
}

impl ClientConfig {
    /// Sets the base url.
    pub fn base_url(self, base_url: &str) -> Self {
        ClientConfig {
            base_url: base_url.to_string(),
            ..self
        }
    }

    pub fn page_size(self, page_size: u32) -> Self {
        ClientConfig { page_size, ..self }
    }

    pub fn limits(self, limits: ValidationLimits) -> Self {
        ClientConfig { limits, ..self }
    }

    pub fn max_retries(self, max_retries: u32) -> Self {
        ClientConfig {
            max_retries,
            ..self
        }
    }

    pub fn get_limits(&self) -> &ValidationLimits {
        &self.limits
    }
}

/// Catalog api client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    pub(crate) client: Arc<HttpClient>,
    pub(crate) config: ClientConfig,
}

impl CatalogClient {
    /// Creates a new client with default configuration.
    ///
    /// # Example
    /// ```rust,no_run
    /// use catalog::prelude::*;
    /// # fn create_client() -> Result<CatalogClient, CatalogError> {
    /// let client = CatalogClient::new()?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with the provided configuration.
    ///
    /// # Errors
    /// - [`CatalogError::Validation`] if the page size is out of range
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder();
        Self::with_client(client, config)
    }

    /// Creates a client from a `reqwest::ClientBuilder` and configuration.
    /// ClientBuilder can be customized with timeouts, proxies, dns servers, user_agent, etc.
    ///
    /// # Example
    /// ```rust,no_run
    /// use catalog::prelude::*;
    /// # fn create_client() -> Result<CatalogClient, CatalogError> {
    /// let builder = reqwest::Client::builder().timeout(std::time::Duration::from_secs(10));
    /// let client = CatalogClient::with_client(builder, ClientConfig::default())?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn with_client(client: reqwest::ClientBuilder, config: ClientConfig) -> Result<Self> {
        debug!(url=?config.base_url, page_size = config.page_size, "new client");
        config.limits.validate_page_size(config.page_size)?;
        let client = HttpClient::new(
            client,
            config.base_url.clone(),
            config.limits.clone(),
            config.max_retries,
        )?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the base url, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }

    /// Returns a snapshot of HTTP request counters.
    pub fn http_metrics(&self) -> HttpMetricsSnapshot {
        self.client.metrics_snapshot()
    }
}
