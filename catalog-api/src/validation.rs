//! Validation functions
//!

use snafu::prelude::*;

use crate::{
    Result,
    config::{MAX_PAGE_SIZE, VALIDATION_MAX_QUERY_LEN, VALIDATION_SEARCH_MAX_LEN},
    prelude::*,
};

/// Validation limits for sanity checking requests before they are sent.
/// A too-strict limit may cause the program to fail with legitimate inputs, so
/// limits err on the loose side. All limits can be adjusted at client creation time.
#[derive(Debug, Clone)]
pub struct ValidationLimits {
    /// max length of search text in bytes
    pub search_max_len: u64,

    /// max page size (products per request)
    pub max_page_size: u32,

    /// max size of a query (total length of key=value params)
    pub max_query_len: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            // max length of search text (default: 256 bytes)
            search_max_len: u64::from(VALIDATION_SEARCH_MAX_LEN),
            // max page size (default: 100)
            max_page_size: MAX_PAGE_SIZE,
            // max size of query string (approximate) (default: 4000 bytes)
            max_query_len: u64::from(VALIDATION_MAX_QUERY_LEN),
        }
    }
}

impl ValidationLimits {
    /// Checks a product id. Product ids are positive integers.
    #[doc(hidden)]
    pub fn validate_product_id(&self, id: u64) -> Result<()> {
        ensure!(
            id > 0,
            ValidationSnafu {
                message: "product id must be positive".to_string(),
            }
        );
        Ok(())
    }

    #[doc(hidden)]
    pub fn validate_search(&self, text: &str) -> Result<()> {
        ensure!(
            text.len() <= self.search_max_len as usize,
            ValidationSnafu {
                message: format!(
                    "search text too long: {} bytes (max: {})",
                    text.len(),
                    self.search_max_len
                ),
            }
        );
        ensure!(
            !text.chars().any(char::is_control),
            ValidationSnafu {
                message: "search text contains control characters".to_string(),
            }
        );
        Ok(())
    }

    #[doc(hidden)]
    pub fn validate_page_size(&self, limit: u32) -> Result<()> {
        ensure!(
            (1..=self.max_page_size).contains(&limit),
            ValidationSnafu {
                message: format!(
                    "page size {limit} out of range (1..={})",
                    self.max_page_size
                ),
            }
        );
        Ok(())
    }

    #[doc(hidden)]
    pub fn validate_query(&self, query: &[(String, String)]) -> Result<()> {
        let mut query_size = 0;
        for (key, val) in query {
            query_size += key.len() + val.len() + 1;
        }
        ensure!(
            query_size <= self.max_query_len as usize,
            ValidationSnafu {
                message: format!("query too long {query_size}")
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_product_id() -> Result<()> {
        let limits = ValidationLimits::default();
        limits.validate_product_id(1)?;
        assert!(limits.validate_product_id(0).is_err(), "zero id");
        Ok(())
    }

    #[test]
    fn test_validate_search() -> Result<()> {
        let limits = ValidationLimits::default();

        limits.validate_search("")?;
        limits.validate_search("iphone 9")?;

        let long = "x".repeat((limits.search_max_len + 1) as usize);
        assert!(limits.validate_search(&long).is_err(), "too long search");
        assert!(
            limits.validate_search("bad\x00text").is_err(),
            "control characters"
        );
        Ok(())
    }

    #[test]
    fn test_validate_page_size() -> Result<()> {
        let limits = ValidationLimits::default();
        limits.validate_page_size(10)?;
        limits.validate_page_size(limits.max_page_size)?;
        assert!(limits.validate_page_size(0).is_err());
        assert!(limits.validate_page_size(limits.max_page_size + 1).is_err());
        Ok(())
    }

    #[test]
    fn test_validate_query() {
        let limits = ValidationLimits {
            max_query_len: 10,
            ..ValidationLimits::default()
        };
        let short = vec![("q".to_string(), "abc".to_string())];
        assert!(limits.validate_query(&short).is_ok());
        let long = vec![("q".to_string(), "abcdefghijk".to_string())];
        assert!(limits.validate_query(&long).is_err());
    }
}
