//! Unified catalog loader
//!
//! [`ItemsModel`] presents one incremental "load next page" operation over
//! several heterogeneous backend query shapes, plus six one-shot main-page
//! feed loads. It owns the pagination cursors, the accumulated item list and
//! its per-type buckets, the search result state and the feed caches, and
//! notifies a delegate after each push-style load.
//!
//! All operations take `&mut self`, so there is no concurrent mutation: a
//! caller must not start a second generic load before the previous one
//! completes. The transport separately drops superseded responses for
//! restart-style listing requests.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use crate::account::AccountManager;
use crate::api::catalog::{CatalogClient, CatalogError, ItemsEnvelope};
use crate::config::Config;
use crate::models::{dedup_by_identity, FeedKind, Filter, Item, ItemType, PageCursor, Route};
use crate::models::ANIME_GENRE_ID;

/// Notified after every generic/feed/collection/watching load, successful or
/// failed, once the model's state mutation is complete. Search loads are
/// pulled, not pushed, and never notify.
pub trait ItemsDelegate: Send + Sync {
    fn items_updated(&self);
}

/// Side channel for transport failures. The default sink logs through
/// `tracing`; tests substitute a counting sink.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &CatalogError);
}

/// Default sink: structured log entry per failure
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &CatalogError) {
        tracing::error!(%error, "catalog request failed");
    }
}

/// Aggregates the backend's paginated data sources behind one incremental
/// loading contract.
pub struct ItemsModel {
    account: Arc<AccountManager>,
    client: CatalogClient,
    config: Arc<Config>,
    delegate: Option<Weak<dyn ItemsDelegate>>,
    error_sink: Arc<dyn ErrorSink>,

    /// Accumulated items, append-only between refreshes
    pub video_items: Vec<Item>,
    /// Per-type buckets: the subsequence of `video_items` loaded while that
    /// type was selected, keyed by the wire `type` value
    pub video_items_by_type: HashMap<String, Vec<Item>>,
    /// Query parameters mutated by setters and the type selection
    pub parameters: HashMap<String, String>,
    /// Active filter; its values win over `parameters` on key collision
    pub filter: Filter,
    /// Listing cursor
    pub cursor: PageCursor,

    /// Items from the current search session
    pub result_items: Vec<Item>,
    /// Search cursor, independent of the listing cursor
    pub search_cursor: PageCursor,

    // Main-page caches, each fully replaced by its feed load
    pub new_films: Vec<Item>,
    pub new_series: Vec<Item>,
    pub hot_films: Vec<Item>,
    pub hot_series: Vec<Item>,
    pub fresh_movies: Vec<Item>,
    pub fresh_series: Vec<Item>,

    route: Route,
    item_type: Option<ItemType>,
}

impl ItemsModel {
    /// Create a model bound to an account manager. The base URL comes from
    /// the injected config when set.
    pub fn new(account: Arc<AccountManager>, config: Arc<Config>) -> Self {
        let client = match config.api_url.as_deref() {
            Some(url) => CatalogClient::with_base_url(account.clone(), url),
            None => CatalogClient::new(account.clone()),
        };
        Self::with_client(account, config, client)
    }

    /// Create a model whose client targets a custom base URL (for testing)
    pub fn with_base_url(
        account: Arc<AccountManager>,
        config: Arc<Config>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = CatalogClient::with_base_url(account.clone(), base_url);
        Self::with_client(account, config, client)
    }

    fn with_client(account: Arc<AccountManager>, config: Arc<Config>, client: CatalogClient) -> Self {
        Self {
            account,
            client,
            config,
            delegate: None,
            error_sink: Arc::new(TracingSink),
            video_items: Vec::new(),
            video_items_by_type: HashMap::new(),
            parameters: HashMap::new(),
            filter: Filter::default(),
            cursor: PageCursor::default(),
            result_items: Vec::new(),
            search_cursor: PageCursor::default(),
            new_films: Vec::new(),
            new_series: Vec::new(),
            hot_films: Vec::new(),
            hot_series: Vec::new(),
            fresh_movies: Vec::new(),
            fresh_series: Vec::new(),
            route: Route::default(),
            item_type: None,
        }
    }

    /// Register the delegate. Held non-owning: a dropped delegate turns
    /// notifications into no-ops.
    pub fn set_delegate(&mut self, delegate: Weak<dyn ItemsDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_error_sink(&mut self, sink: Arc<dyn ErrorSink>) {
        self.error_sink = sink;
    }

    // -------------------------------------------------------------------------
    // Route dispatch
    // -------------------------------------------------------------------------

    /// Load the next batch for the active route, reporting how many items
    /// were appended. No-op without an account.
    pub async fn load_video_items(&mut self) -> Option<usize> {
        self.load_video_items_with_error().await.0
    }

    /// Same dispatch as [`load_video_items`](Self::load_video_items), but
    /// additionally surfaces the transport error for the generic route.
    pub async fn load_video_items_with_error(
        &mut self,
    ) -> (Option<usize>, Option<CatalogError>) {
        if !self.account.has_account() {
            return (None, None);
        }
        match self.route.clone() {
            Route::Watching => (self.load_watching_series(1).await, None),
            Route::Used => (self.load_watching_series(0).await, None),
            Route::UsedMovie => (self.load_watching_movies().await, None),
            Route::Collections => (self.load_items_collection().await, None),
            Route::Generic(_) => self.load_videos().await,
        }
    }

    // -------------------------------------------------------------------------
    // Loaders
    // -------------------------------------------------------------------------

    /// Generic paginated listing load
    async fn load_videos(&mut self) -> (Option<usize>, Option<CatalogError>) {
        let mut params = self.parameters.clone();
        params.insert("page".to_string(), self.cursor.page.to_string());
        params.insert("perpage".to_string(), "50".to_string());
        self.filter.apply_to(&mut params);

        let tag = self.route.path_tag().map(str::to_string);
        match self.client.receive_items(&params, tag.as_deref(), true).await {
            Ok(envelope) => {
                // A successful envelope without an item list means no work:
                // no cursor movement, no notification.
                let Some(mut items) = envelope.items else {
                    return (None, None);
                };
                self.cursor
                    .advance(envelope.pagination.and_then(|p| p.total));
                if self.config.hide_anime {
                    items.retain(|item| !item.has_genre_id(ANIME_GENRE_ID));
                }
                let count = items.len();
                self.video_items.extend(items.iter().cloned());
                if let Some(key) = params.get("type") {
                    self.video_items_by_type
                        .entry(key.clone())
                        .or_default()
                        .extend(items);
                }
                self.notify_delegate();
                (Some(count), None)
            }
            // Superseded by a newer listing request; the winner reports.
            Err(CatalogError::Superseded) => (None, None),
            Err(error) => {
                self.error_sink.report(&error);
                self.notify_delegate();
                (None, Some(error))
            }
        }
    }

    /// Watching/history series load: appends, then de-duplicates the whole
    /// accumulated list by identity. The reported count is pre-dedup.
    async fn load_watching_series(&mut self, subscribed: u8) -> Option<usize> {
        let result = self.client.receive_watching_series(subscribed).await;
        self.merge_watching(result, true)
    }

    /// Watched-movies load: appends without dedup
    async fn load_watching_movies(&mut self) -> Option<usize> {
        let result = self.client.receive_watching_movies().await;
        self.merge_watching(result, false)
    }

    fn merge_watching(
        &mut self,
        result: Result<ItemsEnvelope, CatalogError>,
        dedup: bool,
    ) -> Option<usize> {
        match result {
            Ok(envelope) => {
                let items = envelope.items?;
                let count = items.len();
                self.video_items.extend(items);
                if dedup {
                    dedup_by_identity(&mut self.video_items);
                }
                self.notify_delegate();
                Some(count)
            }
            Err(error) => {
                self.error_sink.report(&error);
                self.notify_delegate();
                None
            }
        }
    }

    /// Collection load: flat item list, appended as-is, pagination ignored
    async fn load_items_collection(&mut self) -> Option<usize> {
        match self.client.receive_items_collection(&self.parameters).await {
            Ok(items) => {
                let count = items.len();
                self.video_items.extend(items);
                self.notify_delegate();
                Some(count)
            }
            Err(error) => {
                self.error_sink.report(&error);
                self.notify_delegate();
                None
            }
        }
    }

    /// Title search. Builds a fresh parameter set and explicitly opts out of
    /// the single-flight cancellation, so concurrent keystroke-driven
    /// searches all resolve; completions can arrive out of order and callers
    /// needing strict ordering must sequence results themselves.
    ///
    /// Appends to `result_items` and advances the search cursor. Does not
    /// notify the delegate: search results are pulled, not pushed.
    pub async fn load_search_items(
        &mut self,
        title: &str,
        use_cursor_paging: bool,
    ) -> Option<usize> {
        let mut params = HashMap::new();
        params.insert("title".to_string(), title.to_string());
        if use_cursor_paging {
            params.insert("page".to_string(), self.search_cursor.page.to_string());
        } else {
            params.insert("perpage".to_string(), "50".to_string());
        }

        match self.client.receive_items(&params, None, false).await {
            Ok(envelope) => {
                let items = envelope.items?;
                self.search_cursor
                    .advance(envelope.pagination.and_then(|p| p.total));
                let count = items.len();
                self.result_items.extend(items);
                Some(count)
            }
            Err(_) => None,
        }
    }

    /// One-shot main-page feed load. Fully replaces the feed's cache with
    /// the fetched page; `NewSeries` additionally honors the hide-anime
    /// setting. No-op without an account.
    pub async fn load_feed(&mut self, kind: FeedKind) -> Option<usize> {
        if !self.account.has_account() {
            return None;
        }
        let mut params = self.parameters.clone();
        kind.apply_params(&mut params, SystemTime::now());

        match self.client.receive_items(&params, kind.path_tag(), true).await {
            Ok(envelope) => {
                let mut items = envelope.items?;
                if kind.filters_hidden_genre() && self.config.hide_anime {
                    items.retain(|item| !item.has_genre_id(ANIME_GENRE_ID));
                }
                let count = items.len();
                *self.feed_cache_mut(kind) = items;
                self.notify_delegate();
                Some(count)
            }
            Err(CatalogError::Superseded) => None,
            Err(error) => {
                self.error_sink.report(&error);
                self.notify_delegate();
                None
            }
        }
    }

    fn feed_cache_mut(&mut self, kind: FeedKind) -> &mut Vec<Item> {
        match kind {
            FeedKind::NewFilms => &mut self.new_films,
            FeedKind::NewSeries => &mut self.new_series,
            FeedKind::HotFilms => &mut self.hot_films,
            FeedKind::HotSeries => &mut self.hot_series,
            FeedKind::FreshMovies => &mut self.fresh_movies,
            FeedKind::FreshSeries => &mut self.fresh_series,
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Set or clear one query parameter
    pub fn set_parameter(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.parameters.insert(key.to_string(), value.to_string());
            }
            None => {
                self.parameters.remove(key);
            }
        }
    }

    /// Select the active catalog type, driving the `type` and `genre`
    /// parameters
    pub fn set_type(&mut self, item_type: Option<ItemType>) {
        self.item_type = item_type;
        match item_type {
            Some(item_type) => {
                self.parameters
                    .insert("type".to_string(), item_type.as_str().to_string());
                self.parameters
                    .insert("genre".to_string(), item_type.pinned_genre().to_string());
            }
            None => {
                self.parameters.remove("type");
            }
        }
    }

    pub fn item_type(&self) -> Option<ItemType> {
        self.item_type
    }

    /// Select the active route
    pub fn config_route(&mut self, route: Route) {
        self.route = route;
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Reset the listing cursor and clear the accumulated items. Only the
    /// bucket of the currently selected type is cleared; `type` scopes which
    /// bucket is active, so the others stay as loaded.
    pub fn refresh(&mut self) {
        self.cursor.page = 1;
        self.video_items.clear();
        let Some(item_type) = self.item_type else {
            return;
        };
        if let Some(bucket) = self.video_items_by_type.get_mut(item_type.as_str()) {
            bucket.clear();
        }
    }

    /// Reset the search cursor and clear the search results
    pub fn refresh_search(&mut self) {
        self.search_cursor.page = 1;
        self.result_items.clear();
    }

    /// Page size policy for the active route, advisory for prefetch
    /// thresholds
    pub fn count_per_page(&self) -> u32 {
        self.route.page_size()
    }

    fn notify_delegate(&self) {
        if let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) {
            delegate.items_updated();
        }
    }
}
