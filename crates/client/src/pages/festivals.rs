use std::sync::Arc;

use cinefest_shared::models::{EnrichedItem, ItemDetails};
use tracing::{info, warn};

use crate::enrich::Pipeline;
use crate::selection::{SelectionSync, ViewportCommand};
use crate::sources::{CatalogQuery, LocationProvider};

#[derive(Debug, Clone, PartialEq)]
pub enum FestivalStatus {
    Idle,
    /// The platform could not give a position; nothing was fetched.
    LocationUnavailable,
    Ready,
    Failed(String),
}

/// Festivals around the user, as a list and as map markers.
pub struct FestivalMapPage {
    pipeline: Pipeline,
    location: Arc<dyn LocationProvider>,
    selection: SelectionSync,
    items: Vec<EnrichedItem>,
    status: FestivalStatus,
    initial_view: Option<ViewportCommand>,
}

impl FestivalMapPage {
    pub fn new(
        pipeline: Pipeline,
        location: Arc<dyn LocationProvider>,
        selection: SelectionSync,
    ) -> Self {
        FestivalMapPage {
            pipeline,
            location,
            selection,
            items: Vec::new(),
            status: FestivalStatus::Idle,
            initial_view: None,
        }
    }

    /// Locate the user and load the festivals nearest to them.
    pub async fn load(&mut self) -> &FestivalStatus {
        self.selection.begin_load();
        self.items.clear();

        let Some(position) = self.location.current_location().await else {
            warn!("Location unavailable, festivals not loaded");
            self.status = FestivalStatus::LocationUnavailable;
            return &self.status;
        };
        self.initial_view = Some(SelectionSync::initial_view(position));

        match self.pipeline.load(&CatalogQuery::Nearest(position)).await {
            Ok(items) => {
                info!(festivals = items.len(), "Festivals loaded");
                self.selection
                    .load_completed(items.iter().map(|f| f.item.coordinate()).collect());
                self.items = items;
                self.status = FestivalStatus::Ready;
            }
            Err(e) => {
                warn!(error = %e, "Festival load failed");
                self.status = FestivalStatus::Failed(e.to_string());
            }
        }
        &self.status
    }

    pub fn status(&self) -> &FestivalStatus {
        &self.status
    }

    pub fn initial_view(&self) -> Option<ViewportCommand> {
        self.initial_view
    }

    pub fn items(&self) -> &[EnrichedItem] {
        &self.items
    }

    pub fn on_list_activated(&mut self, index: usize) -> Option<ViewportCommand> {
        self.selection.on_list_activated(index)
    }

    pub fn on_marker_activated(&mut self, index: usize) -> Option<ViewportCommand> {
        self.selection.on_marker_activated(index)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.selected()
    }

    pub fn selected(&self) -> Option<&EnrichedItem> {
        self.selection.selected().and_then(|i| self.items.get(i))
    }

    /// Lines shown in the side panel for the selected festival.
    pub fn selected_summary(&self) -> Option<Vec<String>> {
        let selected = self.selected()?;
        let ItemDetails::Festival(festival) = &selected.item.details else {
            return None;
        };
        let mut lines = vec![festival.name.clone(), festival.period_label().to_string()];
        if let Some(discipline) = festival.discipline_kind() {
            lines.push(discipline.to_string());
        }
        let address = festival.full_address();
        if !address.is_empty() {
            lines.push(address);
        }
        if let Some(contact) = festival.contact_link() {
            lines.push(contact);
        }
        Some(lines)
    }
}
