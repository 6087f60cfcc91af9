//! # Image library
//!
//! The image library for a product is the product's own images followed by
//! [`SYNTHETIC_IMAGE_COUNT`] placeholder icons served by the same api.
//!
//! Image ids and display names are derived from a SHA-256 digest of the url,
//! so the same url always yields the same `Image` across fetches.

use std::{ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Result, client::CatalogClient, http_client::HttpClient, prelude::*};

/// Number of placeholder icons appended to every image library.
pub const SYNTHETIC_IMAGE_COUNT: usize = 20;

const NAME_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An image in the library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Image {
    /// stable id (16 hex chars) derived from the url
    pub id: String,
    pub url: String,
    /// short display label derived from the url
    pub name: String,
    /// position in the fetched library
    pub index: usize,
}

impl Image {
    /// Creates an image for `url` at position `index`.
    pub fn from_url(url: impl Into<String>, index: usize) -> Self {
        let url = url.into();
        let digest = Sha256::digest(url.as_bytes());
        let id = hex::encode(&digest[..8]);
        let name = digest
            .iter()
            .skip(8)
            .take(NAME_LEN)
            .map(|b| char::from(BASE36[usize::from(*b) % BASE36.len()]))
            .collect();
        Self {
            id,
            url,
            name,
            index,
        }
    }
}

/// Returns the urls of the placeholder icons, in library order.
pub fn synthetic_image_urls(base_url: &str) -> Vec<String> {
    let base_url = base_url.trim_end_matches('/');
    (0..SYNTHETIC_IMAGE_COUNT)
        .map(|i| format!("{base_url}/icon/abc{i}/500"))
        .collect()
}

/// The ordered image library of one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub product_id: u64,
    images: Vec<Image>,
}

impl ImageSet {
    /// Builds the library from the product's urls followed by the placeholder urls.
    /// Duplicate urls are kept once, at their first position.
    pub fn new(
        product_id: u64,
        product_urls: impl IntoIterator<Item = String>,
        synthetic_urls: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut images: Vec<Image> = Vec::new();
        for url in product_urls.into_iter().chain(synthetic_urls) {
            if images.iter().any(|image| image.url == url) {
                continue;
            }
            let index = images.len();
            images.push(Image::from_url(url, index));
        }
        Self { product_id, images }
    }

    /// Finds an image by id.
    pub fn get(&self, id: &str) -> Option<&Image> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn into_vec(self) -> Vec<Image> {
        self.images
    }
}

impl Deref for ImageSet {
    type Target = [Image];

    fn deref(&self) -> &Self::Target {
        &self.images
    }
}

/// Request builder for a product's image library.
///
/// Obtained via [`CatalogClient::image_library`].
#[derive(Debug)]
pub struct ImageLibraryRequest {
    client: Arc<HttpClient>,
    limits: ValidationLimits,
    product_id: u64,
}

impl ImageLibraryRequest {
    /// Fetches the product and builds its image library.
    pub async fn get(self) -> Result<ImageSet> {
        self.limits.validate_product_id(self.product_id)?;
        let product =
            crate::products::ProductRequest::new(self.client.clone(), self.limits, self.product_id)
                .get()
                .await?;
        Ok(ImageSet::new(
            product.id,
            product.images,
            synthetic_image_urls(&self.client.base_url),
        ))
    }
}

impl CatalogClient {
    /// Creates a request builder for a product's image library.
    pub fn image_library(&self, product_id: u64) -> ImageLibraryRequest {
        ImageLibraryRequest {
            client: self.client.clone(),
            limits: self.config.limits.clone(),
            product_id,
        }
    }
}
