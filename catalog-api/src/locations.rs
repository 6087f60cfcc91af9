//! Locations an item can be assigned to.
//!
//! The api has no location resource; the candidates are a fixed list.

use serde::{Deserialize, Serialize};

use crate::{Result, client::CatalogClient};

/// A location candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Returns the fixed location candidates.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("1", "Locations"),
        Location::new("2", "Square"),
        Location::new("3", "Test 2"),
        Location::new("4", "Available at all future locations"),
    ]
}

/// Request builder for location candidates.
///
/// Obtained via [`CatalogClient::locations`].
#[derive(Debug, Default)]
pub struct ListLocationsRequest {
    _private: (),
}

impl ListLocationsRequest {
    /// Returns the location candidates.
    #[allow(clippy::unused_async)]
    pub async fn list(self) -> Result<Vec<Location>> {
        Ok(default_locations())
    }
}

impl CatalogClient {
    /// Creates a request builder for location candidates.
    pub fn locations(&self) -> ListLocationsRequest {
        ListLocationsRequest::default()
    }
}
