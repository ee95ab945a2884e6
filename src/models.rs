//! Data structures and types for streamcat
//!
//! Contains the shared models used across the crate:
//! - **Catalog**: items, genres and item types as the backend sends them
//! - **Paging**: page cursors for the listing and search flows
//! - **Routing**: which backend query path a load uses, and the main-page
//!   feed kinds with their sort/window policies
//! - **Filters**: user-selected filter criteria serializable to query
//!   parameters

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Genre id the catalog hides when the hide-anime setting is on.
pub const ANIME_GENRE_ID: i64 = 25;

// =============================================================================
// Catalog Models
// =============================================================================

/// A genre attached to a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub title: String,
}

/// A catalog entry: movie, series, documentary, concert...
///
/// Identity is the backend `id`; equality compares identity only, which is
/// what the de-duplication paths rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub genres: Option<Vec<Genre>>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
}

impl Item {
    /// Whether any of the item's genres carries the given id.
    pub fn has_genre_id(&self, id: i64) -> bool {
        self.genres
            .as_ref()
            .map_or(false, |genres| genres.iter().any(|g| g.id == id))
    }
}

impl PartialEq for Item {
    // Identity comparison: two entries for the same backend id are the
    // same item regardless of metadata drift between endpoints.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Drop later duplicates by item identity, keeping the relative order of
/// first occurrences.
pub fn dedup_by_identity(items: &mut Vec<Item>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id));
}

/// Catalog category, driving the `type` and `genre` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Movies,
    Serials,
    Cartoons,
    Documentaries,
    TvShows,
    Concerts,
}

impl ItemType {
    /// Wire value sent as the `type` parameter; also the bucket key the
    /// model accumulates loaded items under.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Movies => "movie",
            ItemType::Serials => "serial",
            ItemType::Cartoons => "cartoon",
            ItemType::Documentaries => "documovie",
            ItemType::TvShows => "tvshow",
            ItemType::Concerts => "concert",
        }
    }

    /// Value pinned into the `genre` parameter when this type is selected.
    /// Cartoons are a genre on the backend, not a type of their own.
    pub fn pinned_genre(&self) -> &'static str {
        match self {
            ItemType::Cartoons => "23",
            _ => "",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Paging
// =============================================================================

/// Pagination cursor: the next page to request and the last reported total.
///
/// The listing and search flows each own an independent cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub total: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self { page: 1, total: 1 }
    }
}

impl PageCursor {
    /// Advance past a fetched page, recording the reported total
    /// (absent totals count as a single page).
    pub fn advance(&mut self, total: Option<u32>) {
        self.page += 1;
        self.total = total.unwrap_or(1);
    }

    pub fn has_more(&self) -> bool {
        self.page <= self.total
    }
}

// =============================================================================
// Routing
// =============================================================================

/// Which backend query path a `load_video_items` call uses, and with it the
/// merge/dedup policy applied to the response.
///
/// `Generic` covers plain catalog listings and carries the optional backend
/// path tag (`"hot"`, `"fresh"`, unset for the default listing); absent and
/// unrecognized tags both land here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Series the account is currently watching (subscribed)
    Watching,
    /// Series already watched (history)
    Used,
    /// Movies already watched
    UsedMovie,
    /// A collection view: flat item list, no pagination
    Collections,
    /// Paginated catalog listing, optionally under a path tag
    Generic(Option<String>),
}

impl Default for Route {
    fn default() -> Self {
        Route::Generic(None)
    }
}

impl Route {
    /// Map a legacy string tag onto a route.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag {
            Some("watching") => Route::Watching,
            Some("used") => Route::Used,
            Some("usedMovie") => Route::UsedMovie,
            Some("collections") => Route::Collections,
            Some(other) => Route::Generic(Some(other.to_string())),
            None => Route::Generic(None),
        }
    }

    /// Page size policy for this route. Advisory for prefetch thresholds;
    /// the generic request path sends its own `perpage`.
    pub fn page_size(&self) -> u32 {
        match self {
            Route::Watching | Route::Used | Route::UsedMovie => 51,
            Route::Collections => 100,
            Route::Generic(_) => 20,
        }
    }

    /// Backend path tag for the generic listing endpoint.
    pub fn path_tag(&self) -> Option<&str> {
        match self {
            Route::Generic(Some(tag)) => Some(tag),
            _ => None,
        }
    }
}

// =============================================================================
// Main-page feeds
// =============================================================================

/// Hot films restrict to items created within this window.
const HOT_WINDOW_SECS: u64 = 3600 * 24 * 30;

/// One of the six main-page feeds. Each kind carries its own query policy
/// (type, sort, time window, backend path tag) as data, so a single loader
/// serves all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    NewFilms,
    NewSeries,
    HotFilms,
    HotSeries,
    FreshMovies,
    FreshSeries,
}

impl FeedKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            FeedKind::NewFilms | FeedKind::HotFilms | FeedKind::FreshMovies => ItemType::Movies,
            FeedKind::NewSeries | FeedKind::HotSeries | FeedKind::FreshSeries => ItemType::Serials,
        }
    }

    /// Backend path tag the feed queries under.
    pub fn path_tag(&self) -> Option<&'static str> {
        match self {
            FeedKind::HotSeries => Some("popular"),
            FeedKind::FreshMovies | FeedKind::FreshSeries => Some("fresh"),
            FeedKind::NewFilms | FeedKind::NewSeries | FeedKind::HotFilms => None,
        }
    }

    /// Whether this feed applies the hide-anime genre filter to results.
    pub fn filters_hidden_genre(&self) -> bool {
        matches!(self, FeedKind::NewSeries)
    }

    /// Write the feed's type/sort/window parameters into `params`,
    /// overwriting anything already there under the same keys.
    pub fn apply_params(&self, params: &mut HashMap<String, String>, now: SystemTime) {
        params.insert("type".to_string(), self.item_type().as_str().to_string());
        match self {
            FeedKind::NewFilms | FeedKind::NewSeries => {
                params.insert("sort".to_string(), "-created".to_string());
            }
            FeedKind::HotFilms => {
                let cutoff = now
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0)
                    .saturating_sub(HOT_WINDOW_SECS);
                params.insert("conditions[0]".to_string(), format!("created>{}", cutoff));
                params.insert("sort".to_string(), "-views".to_string());
            }
            FeedKind::HotSeries | FeedKind::FreshMovies | FeedKind::FreshSeries => {}
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// A named set of active filter criteria, serializable to query parameters.
///
/// `Filter::default()` is the empty filter. On merge, filter values win on
/// key collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub name: String,
    params: HashMap<String, String>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    /// Set or clear one criterion.
    pub fn set(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.params.insert(key.to_string(), value.to_string());
            }
            None => {
                self.params.remove(key);
            }
        }
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Union-in-place into `params`; filter values overwrite prior values.
    pub fn apply_to(&self, params: &mut HashMap<String, String>) {
        for (key, value) in &self.params {
            params.insert(key.clone(), value.clone());
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn item(id: u64, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
            item_type: None,
            year: None,
            genres: None,
            rating: None,
            plot: None,
            poster: None,
        }
    }

    fn item_with_genre(id: u64, genre_id: i64) -> Item {
        Item {
            genres: Some(vec![Genre {
                id: genre_id,
                title: "genre".to_string(),
            }]),
            ..item(id, "titled")
        }
    }

    // -------------------------------------------------------------------------
    // Item identity
    // -------------------------------------------------------------------------

    #[test]
    fn test_item_equality_is_identity() {
        let a = item(7, "Seven");
        let b = item(7, "Sept");
        let c = item(8, "Seven");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_item_display() {
        let mut it = item(1, "The Batman");
        assert_eq!(it.to_string(), "The Batman");
        it.year = Some(2022);
        assert_eq!(it.to_string(), "The Batman (2022)");
    }

    #[test]
    fn test_has_genre_id() {
        assert!(item_with_genre(1, ANIME_GENRE_ID).has_genre_id(ANIME_GENRE_ID));
        assert!(!item_with_genre(1, 12).has_genre_id(ANIME_GENRE_ID));
        assert!(!item(1, "no genres").has_genre_id(ANIME_GENRE_ID));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let mut items = vec![
            item(1, "A"),
            item(2, "B"),
            item(2, "B again"),
            item(3, "C"),
            item(1, "A again"),
        ];
        dedup_by_identity(&mut items);
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // First occurrence wins, so the metadata of the first entry stays.
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn test_dedup_noop_on_unique() {
        let mut items = vec![item(1, "A"), item(2, "B")];
        dedup_by_identity(&mut items);
        assert_eq!(items.len(), 2);
    }

    // -------------------------------------------------------------------------
    // ItemType
    // -------------------------------------------------------------------------

    #[test]
    fn test_item_type_wire_values() {
        assert_eq!(ItemType::Movies.as_str(), "movie");
        assert_eq!(ItemType::Serials.as_str(), "serial");
        assert_eq!(ItemType::Documentaries.as_str(), "documovie");
        assert_eq!(ItemType::Concerts.as_str(), "concert");
    }

    #[test]
    fn test_item_type_pinned_genre() {
        assert_eq!(ItemType::Cartoons.pinned_genre(), "23");
        assert_eq!(ItemType::Movies.pinned_genre(), "");
        assert_eq!(ItemType::TvShows.pinned_genre(), "");
    }

    // -------------------------------------------------------------------------
    // PageCursor
    // -------------------------------------------------------------------------

    #[test]
    fn test_cursor_advance() {
        let mut cursor = PageCursor::default();
        assert_eq!(cursor.page, 1);
        cursor.advance(Some(3));
        assert_eq!(cursor.page, 2);
        assert_eq!(cursor.total, 3);
        assert!(cursor.has_more());
    }

    #[test]
    fn test_cursor_advance_without_total() {
        let mut cursor = PageCursor::default();
        cursor.advance(None);
        assert_eq!(cursor.page, 2);
        assert_eq!(cursor.total, 1);
        assert!(!cursor.has_more());
    }

    // -------------------------------------------------------------------------
    // Route
    // -------------------------------------------------------------------------

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse(Some("watching")), Route::Watching);
        assert_eq!(Route::parse(Some("used")), Route::Used);
        assert_eq!(Route::parse(Some("usedMovie")), Route::UsedMovie);
        assert_eq!(Route::parse(Some("collections")), Route::Collections);
        assert_eq!(
            Route::parse(Some("hot")),
            Route::Generic(Some("hot".to_string()))
        );
        assert_eq!(Route::parse(None), Route::Generic(None));
    }

    #[test]
    fn test_route_page_size() {
        assert_eq!(Route::Watching.page_size(), 51);
        assert_eq!(Route::Used.page_size(), 51);
        assert_eq!(Route::UsedMovie.page_size(), 51);
        assert_eq!(Route::Collections.page_size(), 100);
        assert_eq!(Route::Generic(None).page_size(), 20);
        assert_eq!(Route::Generic(Some("hot".to_string())).page_size(), 20);
    }

    #[test]
    fn test_route_path_tag() {
        assert_eq!(Route::Generic(Some("fresh".to_string())).path_tag(), Some("fresh"));
        assert_eq!(Route::Generic(None).path_tag(), None);
        assert_eq!(Route::Watching.path_tag(), None);
    }

    // -------------------------------------------------------------------------
    // FeedKind
    // -------------------------------------------------------------------------

    #[test]
    fn test_feed_types() {
        assert_eq!(FeedKind::NewFilms.item_type(), ItemType::Movies);
        assert_eq!(FeedKind::HotFilms.item_type(), ItemType::Movies);
        assert_eq!(FeedKind::FreshMovies.item_type(), ItemType::Movies);
        assert_eq!(FeedKind::NewSeries.item_type(), ItemType::Serials);
        assert_eq!(FeedKind::HotSeries.item_type(), ItemType::Serials);
        assert_eq!(FeedKind::FreshSeries.item_type(), ItemType::Serials);
    }

    #[test]
    fn test_feed_path_tags() {
        assert_eq!(FeedKind::HotSeries.path_tag(), Some("popular"));
        assert_eq!(FeedKind::FreshMovies.path_tag(), Some("fresh"));
        assert_eq!(FeedKind::FreshSeries.path_tag(), Some("fresh"));
        assert_eq!(FeedKind::NewFilms.path_tag(), None);
        assert_eq!(FeedKind::HotFilms.path_tag(), None);
    }

    #[test]
    fn test_only_new_series_filters_hidden_genre() {
        assert!(FeedKind::NewSeries.filters_hidden_genre());
        assert!(!FeedKind::NewFilms.filters_hidden_genre());
        assert!(!FeedKind::HotSeries.filters_hidden_genre());
    }

    #[test]
    fn test_new_films_params() {
        let mut params = HashMap::new();
        FeedKind::NewFilms.apply_params(&mut params, UNIX_EPOCH);
        assert_eq!(params.get("type").map(String::as_str), Some("movie"));
        assert_eq!(params.get("sort").map(String::as_str), Some("-created"));
    }

    #[test]
    fn test_hot_films_window() {
        let now = UNIX_EPOCH + Duration::from_secs(HOT_WINDOW_SECS + 1000);
        let mut params = HashMap::new();
        FeedKind::HotFilms.apply_params(&mut params, now);
        assert_eq!(params.get("sort").map(String::as_str), Some("-views"));
        assert_eq!(
            params.get("conditions[0]").map(String::as_str),
            Some("created>1000")
        );
    }

    #[test]
    fn test_feed_params_overwrite() {
        let mut params = HashMap::new();
        params.insert("type".to_string(), "serial".to_string());
        FeedKind::FreshMovies.apply_params(&mut params, UNIX_EPOCH);
        assert_eq!(params.get("type").map(String::as_str), Some("movie"));
    }

    // -------------------------------------------------------------------------
    // Filter
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_filter_is_empty() {
        let filter = Filter::default();
        assert!(filter.is_empty());
        let mut params = HashMap::new();
        params.insert("page".to_string(), "1".to_string());
        filter.apply_to(&mut params);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_filter_wins_on_collision() {
        let mut filter = Filter::new("by year");
        filter.set("sort", Some("-year"));
        let mut params = HashMap::new();
        params.insert("sort".to_string(), "-created".to_string());
        params.insert("perpage".to_string(), "50".to_string());
        filter.apply_to(&mut params);
        assert_eq!(params.get("sort").map(String::as_str), Some("-year"));
        assert_eq!(params.get("perpage").map(String::as_str), Some("50"));
    }

    #[test]
    fn test_filter_set_and_clear() {
        let mut filter = Filter::new("test");
        filter.set("genre", Some("12"));
        assert!(!filter.is_empty());
        filter.set("genre", None);
        assert!(filter.is_empty());
    }
}
