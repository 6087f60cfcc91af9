//! Shared test utilities for catalog integration tests
//!
//! - mock server with dummyjson-shaped product pages
//! - client construction pointed at the mock server
#![cfg(test)]
#![allow(dead_code)]

use catalog::prelude::*;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub type TestResult<T> = Result<T, anyhow::Error>;

/// Creates a client for the mock server, with retries disabled.
pub fn client_for(server: &MockServer) -> TestResult<CatalogClient> {
    let config = ClientConfig::default()
        .base_url(&server.uri())
        .max_retries(0);
    Ok(CatalogClient::with_config(config)?)
}

pub fn product_json(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id:03}"),
        "description": format!("Description of product {id}"),
        "price": 9.99,
        "category": "beauty",
        "thumbnail": format!("https://cdn.example.com/{id}/thumbnail.png"),
        "images": [
            format!("https://cdn.example.com/{id}/1.png"),
            format!("https://cdn.example.com/{id}/2.png"),
        ],
    })
}

/// Page of a dummyjson-style product list.
pub fn page_json(total: u64, skip: u64, limit: u64) -> Value {
    let end = (skip + limit).min(total);
    let products: Vec<Value> = (skip + 1..=end).map(product_json).collect();
    json!({
        "products": products,
        "total": total,
        "skip": skip,
        "limit": limit,
    })
}

/// Mounts one page of `/products` for the given skip.
pub async fn mount_page(server: &MockServer, total: u64, skip: u64, limit: u64) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("skip", skip.to_string()))
        .and(query_param("limit", limit.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(total, skip, limit)))
        .mount(server)
        .await;
}

/// Mounts every page of a `/products` listing.
pub async fn mount_all_pages(server: &MockServer, total: u64, limit: u64) {
    let mut skip = 0;
    while skip < total {
        mount_page(server, total, skip, limit).await;
        skip += limit;
    }
}
