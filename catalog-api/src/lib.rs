/*
 * Catalog rust api client
 *
 * SPDX-FileCopyrightText: 2025-2026 Steve Schoettler
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Catalog Rust API Client
//!
//! An async client for the public product catalog demo api (`dummyjson.com`).
//!
//! ## Features
//!
//! - product list and search, with sorting and offset pagination
//! - paginated responses and async Streams
//! - product detail
//! - image library with stable, url-derived image identifiers
//! - fixed location candidates
//! - http middleware with retry logic and rate limit handling
//! - parameter validation
//! - metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog::prelude::*;
//! # async fn example() -> Result<(), CatalogError> {
//!
//! let client = CatalogClient::new()?;
//!
//! // First page of products matching "phone", sorted by title descending
//! let page: PagedResult<ProductSummary> = client.products()
//!     .search("phone")
//!     .sort(SortOrder::Desc)
//!     .limit(10)
//!     .list().await?;
//! for product in page.iter() {
//!     println!("{} {}", product.id, product.title);
//! }
//!
//! // Product detail and its image library
//! let product = client.product(1).get().await?;
//! let images = client.image_library(product.id).get().await?;
//! println!("{}: {} images", product.title, images.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API Structure
//!
//! Methods on `CatalogClient` return request builders that are configured
//! with chained method calls and then executed with a terminal method like
//! `get()` or `list()`.
//!
//! - Pagination uses `PaginatedResponse<T>` and `PagedResult<T>` with `into_stream()` and
//!   `collect_all()` helpers.
//! - A single HTTP pipeline handles validation, logging, deserialization, retries, and rate limits.
//!
#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::needless_raw_strings)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unused_async)]

pub mod client;
pub mod error;
mod http_client;
pub mod images;
pub mod locations;
pub mod paged;
pub mod products;
pub mod validation;

/// Result type alias using `CatalogError` as the default error.
pub type Result<T, E = crate::error::CatalogError> = std::result::Result<T, E>;

/// Prelude module - import (nearly) all the things with `use catalog::prelude::*;`
pub mod prelude {
    pub use super::{CATALOG_DEFAULT_URL, DEFAULT_PAGE_SIZE};
    // Error types
    pub use crate::error::*;
    pub use crate::{
        client::{CatalogClient, ClientConfig},
        // HTTP metrics
        http_client::HttpMetricsSnapshot,
        // Image library
        images::{Image, ImageSet, SYNTHETIC_IMAGE_COUNT, synthetic_image_urls},
        // Locations
        locations::{Location, default_locations},
        // Pagination
        paged::{PagedResult, PaginatedResponse, PaginationMeta},
        // Products
        products::{Product, ProductSummary, SortOrder},
        // Validation
        validation::ValidationLimits,
    };
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Public demo api endpoint
pub const CATALOG_DEFAULT_URL: &str = "https://dummyjson.com";

/// Number of products per page in list screens
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub(crate) mod config {
    /// Environment variable for default endpoint URL
    pub const CATALOG_URL_ENV: &str = "CATALOG_URL";

    /// Environment variable to override the retry cap for failed requests.
    pub const CATALOG_MAX_RETRIES_ENV: &str = "CATALOG_MAX_RETRIES";

    /// Max retries for HTTP client
    pub const MAX_RETRIES_DEFAULT: u32 = 3;

    /// Warn when the rate-limit wait exceeds this duration (seconds).
    pub const RATE_LIMIT_WAIT_WARN_SECS: u64 = 5;

    /// Fail when the rate-limit wait exceeds this duration (seconds).
    pub const RATE_LIMIT_WAIT_MAX_SECS: u64 = 30;

    /// Upper bound of the retry backoff before jitter (milliseconds).
    pub const BACKOFF_MAX_MS: u64 = 30_000;

    /// Maximum page size accepted by the api
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Sort field used by list screens
    pub const SORT_FIELD: &str = "title";

    // Validation limits
    pub const VALIDATION_MAX_QUERY_LEN: u32 = 4000;
    pub const VALIDATION_SEARCH_MAX_LEN: u32 = 256;
}
