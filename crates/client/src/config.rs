//! Client configuration.
//!
//! Resolution order, lowest to highest priority:
//! 1. compiled defaults (the public deployment)
//! 2. TOML config file, if one is given
//! 3. `CINEFEST_*` environment variables

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://backmovies-8saw.onrender.com";
pub const DEFAULT_TMDB_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_LOOKUPS: usize = 8;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the catalog and membership backend
    pub api_url: String,
    pub tmdb_url: String,
    pub tmdb_image_url: String,
    /// Enrichment is disabled when no key is configured
    pub tmdb_api_key: Option<String>,
    pub lookup_timeout_ms: u64,
    pub max_concurrent_lookups: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            tmdb_url: DEFAULT_TMDB_URL.to_string(),
            tmdb_image_url: DEFAULT_TMDB_IMAGE_URL.to_string(),
            tmdb_api_key: None,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            max_concurrent_lookups: DEFAULT_MAX_LOOKUPS,
        }
    }
}

impl ClientConfig {
    /// Load defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `CINEFEST_*` overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CINEFEST_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("CINEFEST_TMDB_URL") {
            self.tmdb_url = v;
        }
        if let Some(v) = lookup("CINEFEST_TMDB_IMAGE_URL") {
            self.tmdb_image_url = v;
        }
        if let Some(v) = lookup("CINEFEST_TMDB_API_KEY") {
            self.tmdb_api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = lookup("CINEFEST_LOOKUP_TIMEOUT_MS") {
            self.lookup_timeout_ms = parse_number("CINEFEST_LOOKUP_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("CINEFEST_MAX_LOOKUPS") {
            self.max_concurrent_lookups = parse_number("CINEFEST_MAX_LOOKUPS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent_lookups == 0 {
            return Err(Error::Config(
                "max_concurrent_lookups must be at least 1".to_string(),
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(Error::Config("lookup_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}: not a number: {value:?}")))
}
