use std::sync::Arc;

use cinefest_shared::models::{poster_url, EnrichedItem, ItemDetails, ItemId, MembershipKind};
use tracing::warn;

use crate::enrich::Pipeline;
use crate::membership::{Annotated, MembershipStore, ToggleOutcome};
use crate::overlay::DetailOverlay;
use crate::sources::CatalogQuery;

/// What the film list renders for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmCard {
    pub entry: Annotated,
    pub poster: String,
}

impl FilmCard {
    /// Button label for list `kind` given the current membership.
    pub fn action_label(&self, kind: MembershipKind) -> &'static str {
        kind.action_label(self.entry.is_member(kind))
    }

    /// Year and director, when the film has either.
    pub fn credits(&self) -> Option<String> {
        let ItemDetails::Film(film) = &self.entry.item.item.details else {
            return None;
        };
        let parts: Vec<String> = film
            .year_label()
            .into_iter()
            .chain(film.director.clone())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Film catalog: list, search, membership buttons and detail overlay.
pub struct CatalogPage {
    pipeline: Pipeline,
    membership: Arc<MembershipStore>,
    overlay: DetailOverlay<EnrichedItem>,
    image_base: String,
    items: Vec<EnrichedItem>,
    loading: bool,
    last_error: Option<String>,
}

impl CatalogPage {
    pub fn new(
        pipeline: Pipeline,
        membership: Arc<MembershipStore>,
        overlay: DetailOverlay<EnrichedItem>,
        image_base: impl Into<String>,
    ) -> Self {
        CatalogPage {
            pipeline,
            membership,
            overlay,
            image_base: image_base.into(),
            items: Vec::new(),
            loading: false,
            last_error: None,
        }
    }

    /// Replace the list with the results of `query`.
    ///
    /// A catalog failure empties the list and is kept as `last_error`.
    pub async fn load(&mut self, query: &CatalogQuery) {
        self.loading = true;
        self.last_error = None;
        self.overlay.close();

        match self.pipeline.load(query).await {
            Ok(items) => self.items = items,
            Err(e) => {
                warn!(error = %e, "Catalog load failed");
                self.items.clear();
                self.last_error = Some(e.to_string());
            }
        }
        self.loading = false;
    }

    /// Empty text loads the whole catalog.
    pub async fn search(&mut self, text: &str) {
        let text = text.trim();
        let query = if text.is_empty() {
            CatalogQuery::All
        } else {
            CatalogQuery::Search(text.to_string())
        };
        self.load(&query).await;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn items(&self) -> &[EnrichedItem] {
        &self.items
    }

    pub fn cards(&self) -> Vec<FilmCard> {
        self.membership
            .annotate(&self.items)
            .into_iter()
            .map(|entry| FilmCard {
                poster: poster_url(entry.item.image.as_ref(), &self.image_base),
                entry,
            })
            .collect()
    }

    pub async fn toggle(&self, kind: MembershipKind, id: &ItemId) -> ToggleOutcome {
        self.membership.toggle(kind, id).await
    }

    /// Open the detail overlay on the item at `index`.
    pub fn open_details(&mut self, index: usize) -> bool {
        match self.items.get(index) {
            Some(item) => {
                self.overlay.open(item.clone());
                true
            }
            None => false,
        }
    }

    pub fn close_details(&mut self) {
        self.overlay.close();
    }

    pub fn details(&self) -> Option<&EnrichedItem> {
        self.overlay.current()
    }
}
