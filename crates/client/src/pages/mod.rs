//! Headless page controllers wiring the core components together.

pub mod catalog;
pub mod festivals;

pub use catalog::{CatalogPage, FilmCard};
pub use festivals::{FestivalMapPage, FestivalStatus};
