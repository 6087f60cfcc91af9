//! Paginated and Stream results for list and search methods.
//!
//! `PaginatedResponse<T>` holds one page of results, with the `total`, `skip`,
//! and `limit` bookkeeping returned by the api.
//!
//! `PagedResult<T>` wraps a `PaginatedResponse<T>` with methods to
//! fetch all pages as a stream [`into_stream()`](PagedResult::into_stream),
//! or collect them into a vector, with [`collect_all()`](PagedResult::collect_all).
//!
use std::{fmt, ops::Deref, sync::Arc};

use futures::{
    StreamExt,
    stream::{BoxStream, unfold},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned, ser::Serializer};

use crate::{
    Result,
    http_client::{HttpClient, HttpRequest},
};

/// A paginated result that can be converted to a stream of all items.
///
/// `PagedResult<T>` wraps a `PaginatedResponse<T>` and retains the information
/// needed to fetch subsequent pages. It implements `Deref` to `PaginatedResponse<T>`,
/// so you can access `.items`, `.pagination`, `.len()`, etc. directly.
///
/// # Example
///
/// ```rust,no_run
/// use catalog::prelude::*;
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), CatalogError> {
/// #   let client = CatalogClient::new()?;
/// // Access first page directly via Deref
/// let result = client.products().list().await?;
/// println!("First page: {} items, total: {}", result.len(), result.pagination.total);
///
/// // Stream all items from all pages
/// let mut stream = client.products().search("phone").list().await?.into_stream();
/// while let Some(product) = stream.next().await {
///     println!("Product: {}", product?.title);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PagedResult<T> {
    response: PaginatedResponse<T>,
    refill: Option<Refill>,
}

// client and request object needed to get next PaginatedResponse
#[derive(Clone)]
struct Refill {
    client: Arc<HttpClient>,
    request: HttpRequest,
}

impl<T> PagedResult<T> {
    /// Creates a new `PagedResult` from a response, client, and the original request.
    pub(crate) fn new(
        response: PaginatedResponse<T>,
        client: Arc<HttpClient>,
        request: HttpRequest,
    ) -> Self {
        Self {
            response,
            refill: Some(Refill { client, request }),
        }
    }

    /// Creates a single-page result from a complete list of items.
    pub fn from_items(items: Vec<T>) -> Self {
        let total = items.len();
        let response = PaginatedResponse {
            items,
            pagination: PaginationMeta {
                total,
                skip: 0,
                limit: total,
            },
        };
        Self {
            response,
            refill: None,
        }
    }

    /// Consumes this result and returns the underlying `PaginatedResponse<T>`.
    pub fn into_response(self) -> PaginatedResponse<T> {
        self.response
    }
}

impl<T> Deref for PagedResult<T> {
    type Target = PaginatedResponse<T>;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

// Implement Debug by delegating to the inner response
impl<T: fmt::Debug> fmt::Debug for PagedResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedResult")
            .field("response", &self.response)
            .finish()
    }
}

// Serialize as the inner response, so cli output of PagedResult<T> matches PaginatedResponse<T>
impl<T: Serialize> Serialize for PagedResult<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.response.serialize(serializer)
    }
}

// stream state: remaining items of the current page, next skip, limit, refill, errored
type StreamState<T> = (std::vec::IntoIter<T>, bool, usize, usize, Option<Refill>, bool);

impl<T: DeserializeOwned + Send + 'static> PagedResult<T> {
    /// Converts this paginated result into a stream of all items across all pages.
    ///
    /// The stream yields items from the first page immediately, then fetches
    /// subsequent pages while the api reports more rows. The stream ends after
    /// the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        let has_more = self.response.has_more();
        let next_skip = self.response.next_skip();
        let limit = self.response.pagination.limit.max(1);
        let current_items = self.response.items.into_iter();

        let state: StreamState<T> = (current_items, has_more, next_skip, limit, self.refill, false);
        unfold(
            state,
            move |(mut items, has_more, skip, limit, refill, errored)| async move {
                if errored {
                    return None;
                }

                if let Some(item) = items.next() {
                    return Some((Ok(item), (items, has_more, skip, limit, refill, false)));
                }

                // Current page exhausted, fetch next page if available
                let refill = refill?;
                if !has_more {
                    return None;
                }
                let next_request = refill.request.with_pagination(skip, limit);
                match refill
                    .client
                    .send::<PaginatedResponse<T>>(next_request.clone())
                    .await
                {
                    Ok(next_response) => {
                        let new_has_more = next_response.has_more();
                        let new_skip = next_response.next_skip();
                        let mut new_items = next_response.items.into_iter();
                        // empty page stops iteration
                        new_items.next().map(|item| {
                            (
                                Ok(item),
                                (
                                    new_items,
                                    new_has_more,
                                    new_skip,
                                    limit,
                                    Some(Refill {
                                        client: refill.client.clone(),
                                        request: next_request,
                                    }),
                                    false,
                                ),
                            )
                        })
                    }
                    Err(e) => Some((Err(e), (items, false, skip, limit, Some(refill), true))),
                }
            },
        )
        .boxed()
    }

    /// Collects all items from all pages into a vector.
    /// Stops on the first error encountered.
    pub async fn collect_all(self) -> Result<Vec<T>> {
        let mut stream = self.into_stream();
        let mut items = Vec::new();

        while let Some(result) = stream.next().await {
            items.push(result?);
        }

        Ok(items)
    }
}

// Implement IntoIterator for the first page only (delegates to PaginatedResponse)
impl<'a, T> IntoIterator for &'a PagedResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.response.items.iter()
    }
}

/// One page of results.
///
/// The api returns the item list under a resource-specific key (`products`),
/// alongside `total`, `skip`, and `limit`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new", alias = "products")]
    pub items: Vec<T>,
    #[serde(flatten)]
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items in this page.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items in this response (may need to get next page for all).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// True if the server has rows after this page.
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && self.next_skip() < self.pagination.total
    }

    /// Offset of the first row after this page.
    pub fn next_skip(&self) -> usize {
        self.pagination.skip + self.items.len()
    }
}

// create iterator over a shared reference to items
impl<'a, T> IntoIterator for &'a PaginatedResponse<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// pagination record keeping, returned as part of `PaginatedResponse`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde::{Deserialize, Serialize};

    use crate::paged::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        id: u64,
        title: String,
    }

    fn items(n: u64) -> Vec<TestItem> {
        (1..=n)
            .map(|id| TestItem {
                id,
                title: format!("Item {id}"),
            })
            .collect()
    }

    #[test]
    fn test_deserialize_products_page() {
        let json = r#"{
            "products": [{"id": 11, "title": "Perfume Oil"}, {"id": 12, "title": "Brown Perfume"}],
            "total": 194, "skip": 10, "limit": 2
        }"#;
        let page: PaginatedResponse<TestItem> = serde_json::from_str(json).expect("page");
        assert_eq!(page.len(), 2);
        assert_eq!(page.items[0].title, "Perfume Oil");
        assert_eq!(
            page.pagination,
            PaginationMeta {
                total: 194,
                skip: 10,
                limit: 2
            }
        );
        assert!(page.has_more());
        assert_eq!(page.next_skip(), 12);
    }

    #[test]
    fn test_last_page_has_no_more() {
        let json = r#"{"products": [{"id": 194, "title": "Last"}], "total": 194, "skip": 193, "limit": 10}"#;
        let page: PaginatedResponse<TestItem> = serde_json::from_str(json).expect("page");
        assert!(!page.has_more());
    }

    #[test]
    fn test_empty_page_has_no_more() {
        let json = r#"{"products": [], "total": 194, "skip": 500, "limit": 0}"#;
        let page: PaginatedResponse<TestItem> = serde_json::from_str(json).expect("page");
        assert!(page.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_deref_and_iter() {
        let paged = PagedResult::from_items(items(2));
        assert_eq!(paged.len(), 2);
        assert_eq!(paged.pagination.total, 2);
        assert!(!paged.has_more());
        let titles: Vec<&str> = paged.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 1", "Item 2"]);

        let mut count = 0;
        for _item in &paged {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_serialize_flattens_pagination() {
        let paged = PagedResult::from_items(items(2));
        let json = serde_json::to_value(&paged).expect("serialize");
        assert_eq!(json["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["total"], 2);
        assert_eq!(json["skip"], 0);
    }

    #[test]
    fn test_debug_implementation() {
        let paged = PagedResult::from_items(items(1));
        let debug_str = format!("{paged:?}");
        assert!(debug_str.contains("PagedResult"));
        assert!(debug_str.contains("TestItem"));
    }

    #[tokio::test]
    async fn test_collect_all_single_page() {
        let all = PagedResult::from_items(items(3))
            .collect_all()
            .await
            .expect("collect_all");
        assert_eq!(all, items(3));
    }

    #[tokio::test]
    async fn test_into_stream_empty_page() {
        let mut stream = PagedResult::<TestItem>::from_items(vec![]).into_stream();
        assert!(stream.next().await.is_none());
    }
}
