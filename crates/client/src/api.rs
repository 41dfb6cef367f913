use async_trait::async_trait;
use cinefest_shared::models::{CatalogItem, Coordinate, Festival, Film, ItemId, MembershipKind};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::sources::{CatalogSource, MembershipRemote};
use crate::{Error, Result};

/// Path segments of the GET endpoint listing a user's records of one kind.
pub fn list_segments(kind: MembershipKind, user_id: &str) -> [&str; 2] {
    match kind {
        MembershipKind::Favorites => ["favoris", user_id],
        MembershipKind::Watched => ["vu", user_id],
        MembershipKind::ToWatch => ["aVoir", user_id],
    }
}

/// Path of the POST endpoint adding a record to a list.
pub fn add_path(kind: MembershipKind) -> &'static str {
    match kind {
        MembershipKind::Favorites => "/favorisPost/add",
        MembershipKind::Watched => "/vu/add",
        MembershipKind::ToWatch => "/aVoir/voirAdd",
    }
}

/// Path segments of the DELETE endpoint removing a record from a list.
pub fn remove_segments<'a>(kind: MembershipKind, user_id: &'a str, id: &'a ItemId) -> [&'a str; 4] {
    let list = match kind {
        MembershipKind::Favorites => "favoris",
        MembershipKind::Watched => "vus",
        MembershipKind::ToWatch => "aVoir",
    };
    [list, "remove", user_id, id.as_str()]
}

pub fn nearest_path(position: Coordinate) -> String {
    format!("/festivalOne/{}/{}", position.lat, position.lon)
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembershipRequest<'a> {
    pub user_id: &'a str,
    pub movie_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRecord {
    #[serde(rename = "_id")]
    pub id: ItemId,
}

/// List responses wrap the records in `favoris` or, for both other kinds, `vus`.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipListResponse {
    #[serde(alias = "favoris", alias = "vus", default)]
    pub items: Vec<IdRecord>,
}

/// HTTP client for the catalog and membership backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        BackendClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL under the base with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid API url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("API url cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn films(&self, req: reqwest::RequestBuilder) -> Result<Vec<CatalogItem>> {
        let films: Vec<Film> = send(req).await?.json().await?;
        Ok(films.into_iter().map(CatalogItem::from).collect())
    }
}

fn authorized(req: reqwest::RequestBuilder, session: Option<&Session>) -> reqwest::RequestBuilder {
    match session {
        Some(session) => req.bearer_auth(&session.token),
        None => req,
    }
}

/// Send a request, mapping non-success statuses to [`Error::Api`].
async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CatalogSource for BackendClient {
    async fn catalog(&self, session: Option<&Session>) -> Result<Vec<CatalogItem>> {
        let req = authorized(self.http.get(self.url("/")), session);
        self.films(req).await
    }

    async fn search(&self, text: &str, session: Option<&Session>) -> Result<Vec<CatalogItem>> {
        let req = authorized(self.http.post(self.url("/search")), session)
            .json(&SearchRequest { query: text });
        self.films(req).await
    }

    async fn nearest(
        &self,
        position: Coordinate,
        session: Option<&Session>,
    ) -> Result<Vec<CatalogItem>> {
        let req = authorized(self.http.get(self.url(&nearest_path(position))), session);
        let festivals: Vec<Festival> = send(req).await?.json().await?;
        Ok(festivals.into_iter().map(CatalogItem::from).collect())
    }
}

#[async_trait]
impl MembershipRemote for BackendClient {
    async fn fetch(&self, kind: MembershipKind, session: &Session) -> Result<Vec<ItemId>> {
        let req = self
            .http
            .get(self.endpoint(&list_segments(kind, &session.user_id))?)
            .bearer_auth(&session.token);
        let list: MembershipListResponse = send(req).await?.json().await?;
        Ok(list.items.into_iter().map(|r| r.id).collect())
    }

    async fn add(&self, kind: MembershipKind, session: &Session, id: &ItemId) -> Result<()> {
        let req = self
            .http
            .post(self.url(add_path(kind)))
            .bearer_auth(&session.token)
            .json(&AddMembershipRequest {
                user_id: &session.user_id,
                movie_id: id.as_str(),
            });
        send(req).await?;
        Ok(())
    }

    async fn remove(&self, kind: MembershipKind, session: &Session, id: &ItemId) -> Result<()> {
        let req = self
            .http
            .delete(self.endpoint(&remove_segments(kind, &session.user_id, id))?)
            .bearer_auth(&session.token);
        send(req).await?;
        Ok(())
    }
}
