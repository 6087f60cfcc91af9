//! # Catalog Products
//!
//! Fluent builder API for listing, searching, and reading products.
//!
//! ## Product methods on `CatalogClient`
//!
//! - [`products`](CatalogClient::products) - list or search products, one page at a time
//! - [`product`](CatalogClient::product) - get product detail
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog::prelude::*;
//!
//! # async fn example() -> Result<(), CatalogError> {
//! #   let client = CatalogClient::new()?;
//! // second page of products matching "phone", sorted by title
//! let page = client.products()
//!     .search("phone")
//!     .sort(SortOrder::Asc)
//!     .offset(10)
//!     .limit(10)
//!     .list().await?;
//!
//! let detail = client.product(page.items[0].id).get().await?;
//! println!("{}: {}", detail.title, detail.description);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Result,
    client::CatalogClient,
    config::SORT_FIELD,
    http_client::{GetPaged, HttpClient},
    prelude::*,
};

/// Sort direction for product lists (sorted by title).
#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Returns the opposite direction.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// One row of a product list.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Full product detail.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    /// Native image urls, in api order
    #[serde(default)]
    pub images: Vec<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            thumbnail: product.thumbnail.clone(),
            price: product.price,
            category: product.category.clone(),
        }
    }
}

// ============================================================================
// BUILDER STRUCTS (public)
// ============================================================================

/// Request builder for one page of the product list.
///
/// Obtained via [`CatalogClient::products`]. An empty search lists all
/// products; otherwise the search endpoint is used.
#[derive(Debug)]
pub struct ListProductsRequest {
    client: Arc<HttpClient>,
    limits: ValidationLimits,
    search: String,
    sort: SortOrder,
    offset: u32,
    limit: u32,
}

impl ListProductsRequest {
    pub(crate) fn new(client: Arc<HttpClient>, limits: ValidationLimits, limit: u32) -> Self {
        Self {
            client,
            limits,
            search: String::new(),
            sort: SortOrder::default(),
            offset: 0,
            limit,
        }
    }

    /// Sets the search text. Leading and trailing whitespace is ignored.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into().trim().to_string();
        self
    }

    /// Sets the sort direction (products are sorted by title).
    #[must_use]
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the pagination offset (number of rows to skip).
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the endpoint path and query parameters for this request.
    pub(crate) fn to_path_and_query(&self) -> (&'static str, Vec<(String, String)>) {
        let mut query = vec![
            ("skip".to_string(), self.offset.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("sortBy".to_string(), SORT_FIELD.to_string()),
            ("order".to_string(), self.sort.to_string()),
        ];
        if self.search.is_empty() {
            ("/products", query)
        } else {
            query.push(("q".to_string(), self.search.clone()));
            ("/products/search", query)
        }
    }

    /// Executes the request.
    ///
    /// # Errors
    /// - [`CatalogError::Validation`] if the search text or page size is out of range
    pub async fn list(self) -> Result<PagedResult<ProductSummary>> {
        self.limits.validate_search(&self.search)?;
        self.limits.validate_page_size(self.limit)?;

        let (path, query) = self.to_path_and_query();
        debug!(path, search = %self.search, sort = %self.sort, offset = self.offset, "list products");
        self.client.get_request_paged(path, query).await
    }
}

/// Request builder for a single product.
///
/// Obtained via [`CatalogClient::product`].
#[derive(Debug)]
pub struct ProductRequest {
    client: Arc<HttpClient>,
    limits: ValidationLimits,
    product_id: u64,
}

impl ProductRequest {
    pub(crate) fn new(client: Arc<HttpClient>, limits: ValidationLimits, product_id: u64) -> Self {
        Self {
            client,
            limits,
            product_id,
        }
    }

    /// Retrieves the product detail.
    ///
    /// # Errors
    /// - [`CatalogError::NotFound`] if the product doesn't exist
    /// - [`CatalogError::Validation`] if the id is invalid
    pub async fn get(self) -> Result<Product> {
        self.limits.validate_product_id(self.product_id)?;

        self.client
            .get_request(&format!("/products/{}", self.product_id), Vec::new())
            .await
            .map_err(|e| match e {
                CatalogError::NotFound { .. } => CatalogError::NotFound {
                    obj_type: "Product".to_string(),
                    key: self.product_id.to_string(),
                },
                other => other,
            })
    }
}

// ============================================================================
// CATALOGCLIENT METHODS
// ============================================================================

impl CatalogClient {
    /// Creates a request builder for one page of products.
    /// The page size defaults to the configured `page_size`.
    pub fn products(&self) -> ListProductsRequest {
        ListProductsRequest::new(
            self.client.clone(),
            self.config.limits.clone(),
            self.config.page_size,
        )
    }

    /// Creates a request builder for a single product.
    pub fn product(&self, product_id: u64) -> ProductRequest {
        ProductRequest::new(self.client.clone(), self.config.limits.clone(), product_id)
    }
}
