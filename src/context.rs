//! Session-wide state shared by every view.
//!
//! One [`AppContext`] is built at startup and handed to handlers through the
//! router state. Watchlist mutations go through [`AppContext::toggle`], which
//! updates the store and the in-memory mirror under a single lock.

use anyhow::Result;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::MovieSummary;
use crate::omdb::OmdbApi;
use crate::search::{RequestToken, SearchController, SearchPhase};
use crate::store::WatchlistStore;
use crate::watchlist::{self, Toggled};

/// Search term and number of pages requested, as carried in the search URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQueryState {
    pub query: String,
    pub pages: u32,
}

impl SearchQueryState {
    pub fn new(query: impl Into<String>, pages: u32) -> Self {
        Self {
            query: query.into().trim().to_string(),
            pages: pages.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Path of the search view for this state; `/` when empty.
    pub fn to_path(&self) -> String {
        if self.is_empty() {
            return "/".to_string();
        }
        let mut path = format!("/?q={}", urlencoding::encode(&self.query));
        if self.pages > 1 {
            path.push_str(&format!("&pages={}", self.pages));
        }
        path
    }

    pub fn with_pages(&self, pages: u32) -> Self {
        Self::new(self.query.clone(), pages)
    }
}

/// What one render of the search view needs from the controller.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    pub items: Vec<MovieSummary>,
    pub total_results: u64,
    pub error: Option<String>,
    pub loaded_pages: u32,
    pub first_page_loaded: bool,
}

impl SearchSnapshot {
    fn of(controller: &SearchController) -> Self {
        Self {
            phase: controller.phase(),
            items: controller.items().to_vec(),
            total_results: controller.total_results(),
            error: controller.error().map(str::to_string),
            loaded_pages: controller.loaded_pages(),
            first_page_loaded: controller.is_first_page_loaded(),
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self.phase, SearchPhase::Loaded)
    }
}

pub struct AppContext {
    store: WatchlistStore,
    watchlist: Mutex<Vec<MovieSummary>>,
    search_state: Mutex<SearchQueryState>,
    search: Mutex<SearchController>,
}

impl AppContext {
    pub fn new(store: WatchlistStore) -> Self {
        let initial = store.load();
        info!("Loaded watchlist with {} entries", initial.len());
        Self {
            store,
            watchlist: Mutex::new(initial),
            search_state: Mutex::new(SearchQueryState::default()),
            search: Mutex::new(SearchController::new()),
        }
    }

    pub async fn watchlist(&self) -> Vec<MovieSummary> {
        self.watchlist.lock().await.clone()
    }

    pub async fn watchlist_ids(&self) -> HashSet<String> {
        watchlist::ids(&self.watchlist.lock().await)
    }

    pub async fn is_on_watchlist(&self, id: &str) -> bool {
        self.watchlist.lock().await.iter().any(|e| e.imdb_id == id)
    }

    /// Fresh read of the persisted watchlist.
    pub fn stored_watchlist(&self) -> Vec<MovieSummary> {
        self.store.load()
    }

    /// Adds or removes `summary`. Store and mirror change together or not at all.
    pub async fn toggle(&self, summary: &MovieSummary) -> Result<Toggled> {
        let mut mirror = self.watchlist.lock().await;
        let current = self.store.load();
        let (next, outcome) = watchlist::toggle(current, summary);
        if outcome != Toggled::Ignored {
            self.store.save(&next)?;
        }
        *mirror = next;
        match outcome {
            Toggled::Added => info!("Added '{}' ({}) to watchlist", summary.title, summary.imdb_id),
            Toggled::Removed => info!(
                "Removed '{}' ({}) from watchlist",
                summary.title, summary.imdb_id
            ),
            Toggled::Ignored => warn!("Ignoring watchlist toggle without an id"),
        }
        Ok(outcome)
    }

    pub async fn search_state(&self) -> SearchQueryState {
        self.search_state.lock().await.clone()
    }

    pub async fn set_search_state(&self, state: SearchQueryState) {
        *self.search_state.lock().await = state;
    }

    pub async fn clear_search(&self) {
        self.set_search_state(SearchQueryState::default()).await;
        self.search.lock().await.reset();
    }

    /// Brings the search controller up to `state` and returns what to render.
    ///
    /// A changed query (or a first page that failed) is resubmitted; further
    /// pages are requested until `state.pages` are loaded or results run out.
    pub async fn search(&self, api: &dyn OmdbApi, state: &SearchQueryState) -> SearchSnapshot {
        if state.is_empty() {
            self.clear_search().await;
            return SearchSnapshot::of(&*self.search.lock().await);
        }
        self.set_search_state(state.clone()).await;

        let first = {
            let mut controller = self.search.lock().await;
            let same_query = controller.query() == Some(state.query.as_str());
            let retry = controller.phase() == SearchPhase::Stalled
                && !controller.is_first_page_loaded();
            if !same_query || retry {
                controller.submit(&state.query)
            } else {
                None
            }
        };
        if let Some(token) = first {
            self.fetch_page(api, &state.query, token).await;
        }

        loop {
            let token = {
                let mut controller = self.search.lock().await;
                if controller.query() != Some(state.query.as_str())
                    || controller.loaded_pages() >= state.pages
                {
                    break;
                }
                controller.request_more()
            };
            let Some(token) = token else { break };
            if !self.fetch_page(api, &state.query, token).await {
                break;
            }
        }

        SearchSnapshot::of(&*self.search.lock().await)
    }

    async fn fetch_page(&self, api: &dyn OmdbApi, query: &str, token: RequestToken) -> bool {
        match api.search(query, token.page()).await {
            Ok(page) => self.search.lock().await.apply(token, page),
            Err(e) => {
                warn!("Search for '{}' page {} failed: {:#}", query, token.page(), e);
                self.search.lock().await.fail(token);
                false
            }
        }
    }
}
