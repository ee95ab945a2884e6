//! streamcat - client-side catalog model for a streaming video service
//!
//! Fetches catalog listings (movies, series, hot/fresh/new feeds, watch
//! history, search results, collections) from the backend API and exposes
//! paginated, filtered, de-duplicated item sets to UI controllers.
//!
//! # Modules
//!
//! - `models` - items, types, routes, feeds, filters, page cursors
//! - `api` - catalog HTTP client
//! - `account` - session state and observers
//! - `config` - on-disk configuration
//! - `items` - the unified catalog loader

pub mod account;
pub mod api;
pub mod config;
pub mod items;
pub mod models;

// Re-export commonly used types
pub use models::{
    dedup_by_identity, FeedKind, Filter, Genre, Item, ItemType, PageCursor, Route,
    ANIME_GENRE_ID,
};

pub use account::{AccountManager, AccountObserver, Session};
pub use api::{CatalogClient, CatalogError, ItemsEnvelope, Pagination};
pub use config::Config;
pub use items::{ErrorSink, ItemsDelegate, ItemsModel, TracingSink};
