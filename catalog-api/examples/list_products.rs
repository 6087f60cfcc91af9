// Lists the first page of products, then streams search results.
//
// CATALOG_URL overrides the endpoint.

use catalog::prelude::*;
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<(), CatalogError> {
    let client = CatalogClient::new()?;

    let page = client.products().sort(SortOrder::Desc).list().await?;
    println!("{} of {} products", page.len(), page.pagination.total);
    for product in &page {
        println!("{:>4}  {}", product.id, product.title);
    }

    let mut stream = client
        .products()
        .search("phone")
        .limit(5)
        .list()
        .await?
        .into_stream();

    let mut count = 0usize;
    while let Some(product) = stream.next().await {
        let product = product?;
        count += 1;
        println!("- {} ({})", product.title, product.id);
        if count >= 12 {
            break;
        }
    }

    let first = page.items.first().map(|p| p.id).unwrap_or(1);
    let images = client.image_library(first).get().await?;
    println!("product {first} has {} images in its library", images.len());

    Ok(())
}
