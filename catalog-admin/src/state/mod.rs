//! Screen state for the catalog admin ui.
//!
//! Everything here is synchronous and free of terminal or network code.
//! Fetches are described by request tokens ([`list::PageRequest`],
//! [`editor::TierRequest`]); results come back as [`nav::LoadEvent`]s and
//! are applied only while their token is current.

pub mod editor;
pub mod form;
pub mod list;
pub mod locations;
pub mod nav;
pub mod picker;

#[cfg(test)]
pub(crate) mod fixtures {
    use catalog::prelude::*;

    pub fn summary(id: u64) -> ProductSummary {
        ProductSummary {
            id,
            title: format!("Product {id:03}"),
            thumbnail: format!("https://cdn.example.com/{id}/thumbnail.png"),
            price: Some(9.99),
            category: Some("beauty".to_string()),
        }
    }

    pub fn page(total: usize, skip: usize, len: usize) -> PaginatedResponse<ProductSummary> {
        let end = (skip + len).min(total);
        PaginatedResponse {
            items: (skip + 1..=end).map(|id| summary(id as u64)).collect(),
            pagination: PaginationMeta {
                total,
                skip,
                limit: len,
            },
        }
    }

    pub fn product(id: u64) -> Product {
        Product {
            id,
            title: format!("Product {id:03}"),
            description: "A fine product".to_string(),
            price: Some(12.5),
            category: Some("beauty".to_string()),
            thumbnail: format!("https://cdn.example.com/{id}/thumbnail.png"),
            images: vec![
                format!("https://cdn.example.com/{id}/1.png"),
                format!("https://cdn.example.com/{id}/2.png"),
            ],
        }
    }

    pub fn image_set(id: u64) -> ImageSet {
        ImageSet::new(
            id,
            product(id).images,
            synthetic_image_urls(CATALOG_DEFAULT_URL),
        )
    }
}
