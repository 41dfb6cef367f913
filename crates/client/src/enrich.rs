//! Catalog enrichment pipeline.
//!
//! Loads raw records from a [`CatalogSource`], looks each one up by title in
//! a [`MetadataSource`], attaches the image it finds, and collapses records
//! that share a title to their first occurrence.
//!
//! Lookups run concurrently, at most `max_in_flight` at a time, and each one
//! is bounded by `lookup_timeout`. A lookup that errors, times out, or finds
//! nothing leaves its record unenriched; it never fails the load.

use std::sync::Arc;
use std::time::Duration;

use cinefest_shared::dedupe::dedupe_by_title;
use cinefest_shared::models::{CatalogItem, EnrichedItem, ImageRef};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MAX_LOOKUPS};
use crate::session::Session;
use crate::sources::{CatalogQuery, CatalogSource, MetadataSource};
use crate::{Error, Result};

pub struct Pipeline {
    catalog: Arc<dyn CatalogSource>,
    metadata: Option<Arc<dyn MetadataSource>>,
    session: Option<Session>,
    lookup_timeout: Duration,
    max_in_flight: usize,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        metadata: Option<Arc<dyn MetadataSource>>,
        session: Option<Session>,
    ) -> Self {
        Pipeline {
            catalog,
            metadata,
            session,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            max_in_flight: DEFAULT_MAX_LOOKUPS,
        }
    }

    /// Apply the lookup timeout and concurrency cap from `config`.
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.lookup_timeout = config.lookup_timeout();
        self.max_in_flight = config.max_concurrent_lookups;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    /// Fetch records for `query` and enrich them.
    ///
    /// Only a catalog failure is an error.
    pub async fn load(&self, query: &CatalogQuery) -> Result<Vec<EnrichedItem>> {
        let session = self.session.as_ref();
        let items = match query {
            CatalogQuery::All => self.catalog.catalog(session).await?,
            CatalogQuery::Search(text) => self.catalog.search(text, session).await?,
            CatalogQuery::Nearest(position) => self.catalog.nearest(*position, session).await?,
        };
        info!(query = ?query, records = items.len(), "Catalog loaded");
        Ok(self.enrich(items).await)
    }

    /// Enrich `items` and drop later records whose title was already seen.
    ///
    /// Output order is input order, whatever order the lookups finish in.
    pub async fn enrich(&self, items: Vec<CatalogItem>) -> Vec<EnrichedItem> {
        let total = items.len();
        let enriched: Vec<EnrichedItem> = stream::iter(items)
            .map(|item| self.lookup(item))
            .buffered(self.max_in_flight.max(1))
            .collect()
            .await;

        let with_image = enriched.iter().filter(|e| e.image.is_some()).count();
        let unique = dedupe_by_title(enriched);
        debug!(
            total,
            with_image,
            unique = unique.len(),
            "Enrichment finished"
        );
        unique
    }

    async fn lookup(&self, item: CatalogItem) -> EnrichedItem {
        let Some(metadata) = &self.metadata else {
            return EnrichedItem::plain(item);
        };

        match find_bounded(metadata.as_ref(), &item.title, self.lookup_timeout).await {
            Ok(Some(image)) => EnrichedItem::with_image(item, image),
            Ok(None) => {
                debug!(title = %item.title, "No metadata match");
                EnrichedItem::plain(item)
            }
            Err(e) => {
                warn!(title = %item.title, error = %e, "Metadata lookup failed");
                EnrichedItem::plain(item)
            }
        }
    }
}

/// Look `title` up, failing with [`Error::Timeout`] past `limit`.
async fn find_bounded(
    metadata: &dyn MetadataSource,
    title: &str,
    limit: Duration,
) -> Result<Option<ImageRef>> {
    tokio::time::timeout(limit, metadata.find_by_title(title))
        .await
        .map_err(|_| Error::Timeout(limit))?
}
