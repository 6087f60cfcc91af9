//! Integration tests for pagination helpers and streaming.

mod common;

use std::collections::HashSet;

use common::{TestResult, client_for, mount_all_pages};
use futures::StreamExt;
use wiremock::MockServer;

#[test_log::test(tokio::test)]
async fn test_collect_all_matches_total() -> TestResult<()> {
    let server = MockServer::start().await;
    mount_all_pages(&server, 23, 5).await;
    let client = client_for(&server)?;

    let first_page = client.products().limit(5).list().await?;
    let total = first_page.pagination.total;
    let all = first_page.collect_all().await?;

    assert_eq!(total, 23);
    assert_eq!(all.len(), total, "collect_all should fetch all pages");
    let ids: HashSet<u64> = all.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), total, "no duplicates across pages");
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_stream_matches_collect_all() -> TestResult<()> {
    let server = MockServer::start().await;
    mount_all_pages(&server, 12, 4).await;
    let client = client_for(&server)?;

    let collected = client.products().limit(4).list().await?.collect_all().await?;

    let mut stream = client.products().limit(4).list().await?.into_stream();
    let mut streamed = Vec::new();
    while let Some(item) = stream.next().await {
        streamed.push(item?);
    }

    assert_eq!(collected, streamed, "stream should match collect_all");
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_stream_stops_after_error() -> TestResult<()> {
    let server = MockServer::start().await;
    // only the first page exists; the second request gets wiremock's default 404
    common::mount_page(&server, 20, 0, 10).await;
    let client = client_for(&server)?;

    let mut stream = client.products().list().await?.into_stream();
    let mut ok = 0;
    let mut errors = 0;
    while let Some(item) = stream.next().await {
        match item {
            Ok(_) => ok += 1,
            Err(_) => errors += 1,
        }
    }
    assert_eq!(ok, 10);
    assert_eq!(errors, 1);
    Ok(())
}
