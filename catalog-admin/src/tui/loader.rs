//! Background fetches.
//!
//! Each request is spawned as a tokio task that sends one [`LoadEvent`]
//! back to the ui through an unbounded channel. Tasks are never cancelled;
//! results nobody wants any more are dropped by the receiving state.

use std::time::Duration;

use catalog::prelude::*;
use tokio::{runtime::Handle, sync::mpsc::UnboundedSender};
use tracing::{debug, warn};

use crate::state::{
    editor::{TierKind, TierRequest},
    list::PageRequest,
    nav::{LoadEvent, Request},
};

/// Artificial latency of the slower editor tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadDelays {
    pub images: Duration,
    pub locations: Duration,
}

impl Default for LoadDelays {
    fn default() -> Self {
        Self {
            images: Duration::from_secs(1),
            locations: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    client: CatalogClient,
    tx: UnboundedSender<LoadEvent>,
    runtime: Handle,
    delays: LoadDelays,
}

impl Loader {
    pub fn new(
        client: CatalogClient,
        tx: UnboundedSender<LoadEvent>,
        runtime: Handle,
        delays: LoadDelays,
    ) -> Self {
        Self {
            client,
            tx,
            runtime,
            delays,
        }
    }

    pub fn dispatch(&self, request: Request) {
        match request {
            Request::Page(request) => self.spawn_page(request),
            Request::Tier(request) => self.spawn_tier(request),
        }
    }

    fn spawn_page(&self, request: PageRequest) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        debug!(generation = request.generation, offset = request.offset, "fetch page");
        self.runtime.spawn(async move {
            let result = client
                .products()
                .search(request.query.search.clone())
                .sort(request.query.sort)
                .offset(u32::try_from(request.offset).unwrap_or(u32::MAX))
                .limit(request.limit)
                .list()
                .await
                .map(PagedResult::into_response)
                .map_err(|e| describe("page", &e));
            send(&tx, LoadEvent::Page { request, result });
        });
    }

    fn spawn_tier(&self, request: TierRequest) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let delays = self.delays;
        debug!(kind = %request.kind, product_id = request.product_id, "fetch tier");
        self.runtime.spawn(async move {
            let event = match request.kind {
                TierKind::Detail => LoadEvent::Detail {
                    request,
                    result: client
                        .product(request.product_id)
                        .get()
                        .await
                        .map_err(|e| describe("detail", &e)),
                },
                TierKind::Images => {
                    tokio::time::sleep(delays.images).await;
                    LoadEvent::Images {
                        request,
                        result: client
                            .image_library(request.product_id)
                            .get()
                            .await
                            .map_err(|e| describe("images", &e)),
                    }
                }
                TierKind::Locations => {
                    tokio::time::sleep(delays.locations).await;
                    LoadEvent::Locations {
                        request,
                        result: client
                            .locations()
                            .list()
                            .await
                            .map_err(|e| describe("locations", &e)),
                    }
                }
            };
            send(&tx, event);
        });
    }
}

fn describe(what: &str, err: &CatalogError) -> String {
    warn!(what, error = %err, "fetch failed");
    err.to_string()
}

fn send(tx: &UnboundedSender<LoadEvent>, event: LoadEvent) {
    if tx.send(event).is_err() {
        debug!("ui closed, dropping load result");
    }
}
