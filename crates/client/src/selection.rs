//! Selected-item state shared by the list and the map.
//!
//! Both surfaces report activations as an index into the current list and go
//! through [`SelectionSync::select`], so a click in the list and a click on a
//! marker leave the same state and issue the same viewport command.

use std::sync::Arc;

use cinefest_shared::models::Coordinate;
use tracing::debug;

/// Zoom used when centering on a selected item.
pub const SELECTED_ZOOM: u8 = 16;
/// Zoom used for the initial view around the user's position.
pub const INITIAL_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportCommand {
    pub center: Coordinate,
    pub zoom: u8,
}

/// The map. Commands are fire-and-forget.
pub trait Viewport: Send + Sync {
    fn center_on(&self, command: ViewportCommand);
}

pub struct SelectionSync {
    viewport: Arc<dyn Viewport>,
    positions: Vec<Option<Coordinate>>,
    selected: Option<usize>,
}

impl SelectionSync {
    pub fn new(viewport: Arc<dyn Viewport>) -> Self {
        SelectionSync {
            viewport,
            positions: Vec::new(),
            selected: None,
        }
    }

    /// View centered on the user before any item is selected.
    pub fn initial_view(position: Coordinate) -> ViewportCommand {
        ViewportCommand {
            center: position,
            zoom: INITIAL_ZOOM,
        }
    }

    /// The list is being replaced; nothing is selected until it arrives.
    pub fn begin_load(&mut self) {
        self.positions.clear();
        self.selected = None;
    }

    /// A new list arrived. It replaces the old one, and its first item is
    /// selected.
    pub fn load_completed(&mut self, positions: Vec<Option<Coordinate>>) {
        self.positions = positions;
        self.selected = None;
        if !self.positions.is_empty() {
            self.select(0);
        }
    }

    /// Select `index` and center the map on it.
    ///
    /// Out-of-range indices are ignored. An item without a coordinate is
    /// selected but the map is left where it is.
    pub fn select(&mut self, index: usize) -> Option<ViewportCommand> {
        let Some(position) = self.positions.get(index) else {
            debug!(index, len = self.positions.len(), "Ignoring out-of-range selection");
            return None;
        };
        self.selected = Some(index);

        let command = position.map(|center| ViewportCommand {
            center,
            zoom: SELECTED_ZOOM,
        });
        match command {
            Some(command) => self.viewport.center_on(command),
            None => debug!(index, "Selected item has no coordinate"),
        }
        command
    }

    pub fn on_list_activated(&mut self, index: usize) -> Option<ViewportCommand> {
        self.select(index)
    }

    pub fn on_marker_activated(&mut self, index: usize) -> Option<ViewportCommand> {
        self.select(index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
