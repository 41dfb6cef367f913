//! Seams to the remote collaborators.
//!
//! The HTTP implementations live in [`crate::api`] and [`crate::tmdb`]; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use cinefest_shared::models::{CatalogItem, Coordinate, ImageRef, ItemId, MembershipKind};

use crate::session::Session;
use crate::Result;

/// What to load from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    All,
    Search(String),
    Nearest(Coordinate),
}

/// Raw film and festival records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The full film catalog.
    async fn catalog(&self, session: Option<&Session>) -> Result<Vec<CatalogItem>>;

    /// Films matching free text.
    async fn search(&self, text: &str, session: Option<&Session>) -> Result<Vec<CatalogItem>>;

    /// Festivals nearest to a position.
    async fn nearest(
        &self,
        position: Coordinate,
        session: Option<&Session>,
    ) -> Result<Vec<CatalogItem>>;
}

/// Third-party metadata keyed by title.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// The image of the best match for `title`, if there is one.
    async fn find_by_title(&self, title: &str) -> Result<Option<ImageRef>>;
}

/// System of record for the membership lists.
#[async_trait]
pub trait MembershipRemote: Send + Sync {
    async fn fetch(&self, kind: MembershipKind, session: &Session) -> Result<Vec<ItemId>>;

    async fn add(&self, kind: MembershipKind, session: &Session, id: &ItemId) -> Result<()>;

    async fn remove(&self, kind: MembershipKind, session: &Session, id: &ItemId) -> Result<()>;
}

/// The user's position, when the platform can supply it.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Option<Coordinate>;
}

/// A position known up front (command line, config, tests).
pub struct FixedLocation(pub Option<Coordinate>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Option<Coordinate> {
        self.0
    }
}
