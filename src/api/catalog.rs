//! Catalog API client
//!
//! Issues parametrized catalog queries and returns the response envelope
//! (items plus pagination metadata). Listing requests run under a
//! single-flight policy keyed by query intent: a newer request of the same
//! intent supersedes a pending one and the stale response is dropped here,
//! never observed by the model. Search opts out of that policy.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::account::AccountManager;
use crate::models::Item;

/// Catalog API error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Catalog returned HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Pagination metadata on a listing response
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub total: Option<u32>,
}

/// Response envelope for item listings. `items` can be absent on an
/// otherwise successful response; callers decide what that means.
#[derive(Debug, Deserialize)]
pub struct ItemsEnvelope {
    #[serde(default)]
    pub items: Option<Vec<Item>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct CollectionEnvelope {
    items: Vec<Item>,
}

/// Per-intent in-flight slot. `begin` bumps the generation for an intent;
/// a response whose generation is no longer current has been superseded.
#[derive(Debug, Default)]
pub struct RequestGate {
    generations: Mutex<HashMap<String, u64>>,
}

impl RequestGate {
    pub fn begin(&self, intent: &str) -> u64 {
        let mut generations = self.generations.lock().unwrap();
        let generation = generations.entry(intent.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    pub fn is_current(&self, intent: &str, generation: u64) -> bool {
        self.generations
            .lock()
            .unwrap()
            .get(intent)
            .map_or(false, |current| *current == generation)
    }
}

/// Catalog API client
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
    account: Arc<AccountManager>,
    gate: RequestGate,
}

impl CatalogClient {
    /// Create a new client bound to an account manager
    pub fn new(account: Arc<AccountManager>) -> Self {
        Self::with_base_url(account, "https://api.streamcat.tv")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(account: Arc<AccountManager>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            account,
            gate: RequestGate::default(),
        }
    }

    /// Make an authenticated GET request and parse the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &HashMap<String, String>,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(&url)
            .query(&query)
            .header("Accept", "application/json");
        if let Some(token) = self.account.access_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map_err(|e| CatalogError::InvalidResponse(format!("JSON parse error: {}", e)))
            }
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound),
            status => Err(CatalogError::Status(status.as_u16())),
        }
    }

    /// Fetch a catalog listing, optionally under a backend path tag.
    ///
    /// With `cancel_previous` the call runs under the single-flight gate for
    /// its intent (the path tag, or the plain listing); a response that lost
    /// the race returns [`CatalogError::Superseded`]. Search passes `false`
    /// so rapid keystroke-driven queries all resolve.
    pub async fn receive_items(
        &self,
        parameters: &HashMap<String, String>,
        route_tag: Option<&str>,
        cancel_previous: bool,
    ) -> Result<ItemsEnvelope, CatalogError> {
        let path = match route_tag {
            Some(tag) => format!("/v1/items/{}", tag),
            None => "/v1/items".to_string(),
        };
        let intent = route_tag.unwrap_or("listing");
        let generation = cancel_previous.then(|| self.gate.begin(intent));

        let result = self.get(&path, parameters).await;

        if let Some(generation) = generation {
            if !self.gate.is_current(intent, generation) {
                return Err(CatalogError::Superseded);
            }
        }
        result
    }

    /// Fetch the watching-series list. `subscribed` is 1 for series the
    /// account currently follows, 0 for history.
    pub async fn receive_watching_series(
        &self,
        subscribed: u8,
    ) -> Result<ItemsEnvelope, CatalogError> {
        let mut query = HashMap::new();
        query.insert("subscribed".to_string(), subscribed.to_string());
        self.get("/v1/watching/serials", &query).await
    }

    /// Fetch the watched-movies list
    pub async fn receive_watching_movies(&self) -> Result<ItemsEnvelope, CatalogError> {
        self.get("/v1/watching/movies", &HashMap::new()).await
    }

    /// Fetch a collection view: a flat item list with no pagination envelope
    pub async fn receive_items_collection(
        &self,
        parameters: &HashMap<String, String>,
    ) -> Result<Vec<Item>, CatalogError> {
        let envelope: CollectionEnvelope = self.get("/v1/collections/view", parameters).await?;
        Ok(envelope.items)
    }
}
