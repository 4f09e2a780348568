use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::library::Track;
use crate::query::Query;

pub const DEFAULT_CATALOG_API_URL: &str = "https://api.spotify.com/v1/";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("failed to parse JSON response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// The two remote operations the matcher and uploader need.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Best single track for the query. Any failure is an empty result.
    async fn search(&self, query: &Query) -> Vec<Track>;

    /// Adds the tracks to the user's library. `true` only on confirmed success.
    async fn add_to_library(&self, tracks: &[Track]) -> bool;
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_CATALOG_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Deserialize)]
struct TrackPage {
    items: Vec<Track>,
}

#[derive(Serialize)]
struct AddTracksRequest<'a> {
    ids: Vec<&'a str>,
}

pub struct CatalogClient {
    client: Client,
    search_url: Url,
    library_url: Url,
    token: String,
}

impl CatalogClient {
    pub fn new(token: impl Into<String>, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut base = Url::parse(&config.api_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self {
            client,
            search_url: base.join("search")?,
            library_url: base.join("me/tracks")?,
            token: token.into(),
        })
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Track>, CatalogError> {
        let response = self.client
            .get(self.search_url.clone())
            .bearer_auth(&self.token)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(CatalogError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::Status(status));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(CatalogError::Decode)?;

        Ok(result.tracks.items)
    }

    async fn try_add_to_library(&self, tracks: &[Track]) -> Result<(), CatalogError> {
        let body = AddTracksRequest {
            ids: tracks.iter().map(|track| track.id.as_str()).collect(),
        };

        let response = self.client
            .put(self.library_url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(CatalogError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::Status(status));
        }

        Ok(())
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn search(&self, query: &Query) -> Vec<Track> {
        debug!("Searching catalog for '{}'", query);
        match self.try_search(query).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn add_to_library(&self, tracks: &[Track]) -> bool {
        debug!("Adding {} tracks to library", tracks.len());
        match self.try_add_to_library(tracks).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Adding {} tracks to library failed: {}", tracks.len(), e);
                false
            }
        }
    }
}
