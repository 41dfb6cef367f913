//! TMDB movie search, used to find posters for catalog films.

use async_trait::async_trait;
use cinefest_shared::models::ImageRef;
use serde::Deserialize;

use crate::sources::MetadataSource;
use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<MovieResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl SearchResponse {
    /// Poster of the first result. A first result without a poster is no match.
    pub fn first_poster(self) -> Option<ImageRef> {
        self.results
            .into_iter()
            .next()
            .and_then(|r| r.poster_path)
            .filter(|p| !p.is_empty())
            .map(ImageRef)
    }
}

pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        TmdbClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn search_url(&self, title: &str) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &format!("{}/search/movie", self.base_url),
            &[("api_key", self.api_key.as_str()), ("query", title)],
        )
        .map_err(|e| Error::Config(format!("invalid TMDB url: {e}")))
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn find_by_title(&self, title: &str) -> Result<Option<ImageRef>> {
        let resp = self.http.get(self.search_url(title)?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.first_poster())
    }
}
