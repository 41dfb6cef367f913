pub mod api;
pub mod config;
pub mod enrich;
pub mod error;
pub mod membership;
pub mod overlay;
pub mod pages;
pub mod selection;
pub mod session;
pub mod sources;
pub mod tmdb;

pub use error::{Error, Result};
