//! Paginated product list with search, sort, and infinite scroll.
//!
//! Every reset (new search text, sort flip) starts a new *generation*.
//! Page results carry the generation they were requested in, and results
//! from an older generation are dropped, so rows are always the pages of
//! the current query in fetch order.

use std::collections::HashSet;

use catalog::prelude::*;
use reqwest::Url;
use tracing::debug;

pub use catalog::prelude::SortOrder;

/// Rows from the end of the list at which the next page is requested.
pub const SCROLL_THRESHOLD: usize = 3;

/// One page of list rows, as returned by the api.
pub type Page = PaginatedResponse<ProductSummary>;

const SEARCH_KEY: &str = "search";
const SORT_KEY: &str = "sortOrder";
const NEXT_PAGE_KEY: &str = "nextPage";

/// What the list shows: search text and sort direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub search: String,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn new(search: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            search: search.into().trim().to_string(),
            sort,
        }
    }

    /// Encodes the query, and the cursor of the next unloaded page, as a url query string.
    ///
    /// Empty search and missing cursor are omitted; sort order is always present.
    pub fn to_query_string(&self, next_page: Option<usize>) -> String {
        let Some(mut url) = state_url() else {
            return String::new();
        };
        {
            let mut pairs = url.query_pairs_mut();
            if !self.search.is_empty() {
                pairs.append_pair(SEARCH_KEY, &self.search);
            }
            pairs.append_pair(SORT_KEY, &self.sort.to_string());
            if let Some(cursor) = next_page {
                pairs.append_pair(NEXT_PAGE_KEY, &cursor.to_string());
            }
        }
        url.query().unwrap_or_default().to_string()
    }

    /// Parses a query string written by [`to_query_string`](Self::to_query_string).
    ///
    /// A leading `?` is accepted and unknown keys are ignored.
    ///
    /// # Errors
    /// Returns a message if `sortOrder` or `nextPage` has an invalid value.
    pub fn from_query_string(text: &str) -> Result<(Self, Option<usize>), String> {
        let mut url = state_url().ok_or_else(|| "invalid state url".to_string())?;
        url.set_query(Some(text.trim().trim_start_matches('?')));

        let mut query = Self::default();
        let mut next_page = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                SEARCH_KEY => query.search = value.trim().to_string(),
                SORT_KEY => {
                    query.sort = value
                        .parse()
                        .map_err(|_| format!("invalid {SORT_KEY} '{value}' (expected asc or desc)"))?;
                }
                NEXT_PAGE_KEY => {
                    let cursor = value
                        .parse::<usize>()
                        .map_err(|_| format!("invalid {NEXT_PAGE_KEY} '{value}'"))?;
                    next_page = Some(cursor);
                }
                _ => {}
            }
        }
        Ok((query, next_page))
    }
}

// base for query-string encoding; only the query part is used
fn state_url() -> Option<Url> {
    Url::parse("http://localhost/").ok()
}

/// Token for one page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub query: ListQuery,
    pub offset: usize,
    pub limit: u32,
}

/// Outcome of [`CatalogList::apply_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// First page of a generation; rows were replaced.
    Replaced,
    /// Later page; rows were appended.
    Appended,
    /// Fetch failed; the list is in error state.
    Failed,
    /// Result belongs to an older generation or is not the request in flight.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListError {
    message: String,
    request: PageRequest,
}

/// State of the product list screen.
#[derive(Debug)]
pub struct CatalogList {
    query: ListQuery,
    page_size: u32,
    generation: u64,
    rows: Vec<ProductSummary>,
    row_ids: HashSet<u64>,
    total: Option<usize>,
    // offset of the last applied page, None until the first page resolves
    last_offset: Option<usize>,
    // offsets requested in this generation
    requested: HashSet<usize>,
    in_flight: Option<PageRequest>,
    has_more: bool,
    error: Option<ListError>,
    // keep loading pages until this many rows are present
    restore_until: Option<usize>,
}

impl CatalogList {
    /// Creates the list and the request for its first page.
    pub fn new(query: ListQuery, page_size: u32) -> (Self, PageRequest) {
        let mut list = Self {
            query,
            page_size: page_size.max(1),
            generation: 0,
            rows: Vec::new(),
            row_ids: HashSet::new(),
            total: None,
            last_offset: None,
            requested: HashSet::new(),
            in_flight: None,
            has_more: false,
            error: None,
            restore_until: None,
        };
        let request = list.reset();
        (list, request)
    }

    /// Creates the list from a saved query string.
    /// If the saved state has a cursor, pages are loaded until it is reached.
    pub fn restore(state: &str, page_size: u32) -> Result<(Self, PageRequest), String> {
        let (query, next_page) = ListQuery::from_query_string(state)?;
        let (mut list, request) = Self::new(query, page_size);
        list.restore_until = next_page.filter(|cursor| *cursor > 0);
        Ok((list, request))
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn rows(&self) -> &[ProductSummary] {
        &self.rows
    }

    /// Total rows reported by the api for the current query, once known.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True while the first page of the current generation is loading.
    pub fn is_first_load(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|r| r.offset == 0)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor of the next page to load, if any.
    pub fn next_page(&self) -> Option<usize> {
        if self.has_more {
            self.last_offset.map(|offset| offset + self.page_size as usize)
        } else {
            None
        }
    }

    /// Current state as a query string, for [`restore`](Self::restore).
    pub fn to_query_string(&self) -> String {
        self.query.to_query_string(self.next_page())
    }

    /// Changes the search text. Returns the first-page request if the text changed.
    pub fn set_search(&mut self, text: &str) -> Option<PageRequest> {
        let text = text.trim();
        if text == self.query.search {
            return None;
        }
        self.query.search = text.to_string();
        Some(self.reset())
    }

    /// Flips the sort direction and returns the first-page request.
    pub fn toggle_sort(&mut self) -> PageRequest {
        self.query.sort = self.query.sort.toggled();
        self.reset()
    }

    /// Returns the request for the next page, if one should be loaded now.
    ///
    /// Nothing is returned before the first page resolves, while a page is
    /// loading, after an error, at the end of the list, or for a cursor
    /// already requested in this generation.
    pub fn load_next(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.error.is_some() || !self.has_more {
            return None;
        }
        let offset = self.last_offset? + self.page_size as usize;
        if !self.requested.insert(offset) {
            return None;
        }
        let request = self.request_at(offset);
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// True if `selected` is close enough to the end to load the next page.
    pub fn near_end(&self, selected: usize) -> bool {
        !self.rows.is_empty() && selected + SCROLL_THRESHOLD >= self.rows.len()
    }

    /// True while a restored cursor has not been reached yet.
    pub fn wants_restore(&self) -> bool {
        self.restore_until
            .is_some_and(|target| self.rows.len() < target && self.has_more)
    }

    /// Applies a page result.
    pub fn apply_page(&mut self, request: &PageRequest, result: Result<Page, String>) -> Applied {
        if request.generation != self.generation || self.in_flight.as_ref() != Some(request) {
            debug!(
                generation = request.generation,
                current = self.generation,
                offset = request.offset,
                "dropping stale page"
            );
            return Applied::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let applied = if request.offset == 0 {
                    self.rows.clear();
                    self.row_ids.clear();
                    Applied::Replaced
                } else {
                    Applied::Appended
                };
                self.has_more = page.has_more();
                self.total = Some(page.pagination.total);
                self.last_offset = Some(request.offset);
                self.error = None;
                for row in page.items {
                    if self.row_ids.insert(row.id) {
                        self.rows.push(row);
                    }
                }
                if !self.wants_restore() {
                    self.restore_until = None;
                }
                applied
            }
            Err(message) => {
                self.requested.remove(&request.offset);
                self.error = Some(ListError {
                    message,
                    request: request.clone(),
                });
                Applied::Failed
            }
        }
    }

    /// Re-issues the failed request, if the list is in error state.
    pub fn retry(&mut self) -> Option<PageRequest> {
        let ListError { request, .. } = self.error.take()?;
        self.requested.insert(request.offset);
        self.in_flight = Some(request.clone());
        Some(request)
    }

    fn request_at(&self, offset: usize) -> PageRequest {
        PageRequest {
            generation: self.generation,
            query: self.query.clone(),
            offset,
            limit: self.page_size,
        }
    }

    fn reset(&mut self) -> PageRequest {
        self.generation += 1;
        self.rows.clear();
        self.row_ids.clear();
        self.total = None;
        self.last_offset = None;
        self.requested.clear();
        self.has_more = false;
        self.error = None;
        self.restore_until = None;
        self.requested.insert(0);
        let request = self.request_at(0);
        self.in_flight = Some(request.clone());
        request
    }
}
