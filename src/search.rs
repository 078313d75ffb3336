//! Incremental search results.
//!
//! The controller never performs I/O. Callers take a [`RequestToken`], fetch
//! the page, and hand the response back through [`SearchController::apply`];
//! a response whose token is no longer the pending request is dropped.

use tracing::{debug, warn};

use crate::models::{MovieSummary, SearchResultPage};

const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    LoadingFirstPage,
    Loaded,
    LoadingMore,
    Exhausted,
    /// The last request failed; nothing newer is in flight.
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    generation: u64,
    page: u32,
}

impl RequestToken {
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone)]
pub struct SearchController {
    query: Option<String>,
    generation: u64,
    items: Vec<MovieSummary>,
    next_page: u32,
    total_results: u64,
    error: Option<String>,
    first_page_loaded: bool,
    pending: Option<RequestToken>,
    stalled: bool,
    /// A later page came back empty or as an error envelope.
    ended: bool,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchController {
    pub fn new() -> Self {
        Self {
            query: None,
            generation: 0,
            items: Vec::new(),
            next_page: FIRST_PAGE + 1,
            total_results: 0,
            error: None,
            first_page_loaded: false,
            pending: None,
            stalled: false,
            ended: false,
        }
    }

    /// Starts a new query. A blank query returns the controller to idle.
    pub fn submit(&mut self, query: &str) -> Option<RequestToken> {
        let query = query.trim();
        if query.is_empty() {
            self.reset();
            return None;
        }
        self.generation += 1;
        self.query = Some(query.to_string());
        self.items.clear();
        self.next_page = FIRST_PAGE + 1;
        self.total_results = 0;
        self.error = None;
        self.first_page_loaded = false;
        self.stalled = false;
        self.ended = false;
        let token = RequestToken {
            generation: self.generation,
            page: FIRST_PAGE,
        };
        self.pending = Some(token);
        Some(token)
    }

    pub fn reset(&mut self) {
        // Bumping the generation orphans anything still in flight.
        self.generation += 1;
        self.query = None;
        self.items.clear();
        self.next_page = FIRST_PAGE + 1;
        self.total_results = 0;
        self.error = None;
        self.first_page_loaded = false;
        self.pending = None;
        self.stalled = false;
        self.ended = false;
    }

    /// Token for the next page, if one is due and nothing else is in flight.
    pub fn request_more(&mut self) -> Option<RequestToken> {
        if self.phase() != SearchPhase::Loaded && !(self.stalled && self.first_page_loaded) {
            return None;
        }
        if !self.has_more() {
            return None;
        }
        self.stalled = false;
        let token = RequestToken {
            generation: self.generation,
            page: self.next_page,
        };
        self.pending = Some(token);
        Some(token)
    }

    /// Applies a fetched page. Returns false when the response is stale.
    pub fn apply(&mut self, token: RequestToken, page: SearchResultPage) -> bool {
        if self.pending != Some(token) {
            debug!(
                page = token.page,
                generation = token.generation,
                current = self.generation,
                "Dropping stale search response"
            );
            return false;
        }
        self.pending = None;
        self.stalled = false;
        if token.page == FIRST_PAGE {
            self.items = page.items;
            self.next_page = FIRST_PAGE + 1;
            self.first_page_loaded = true;
            self.total_results = page.total_results;
            self.error = page.error;
            return true;
        }
        // Later pages only ever add items; totals and errors belong to page one.
        if let Some(error) = page.error {
            warn!(page = token.page, "Search page failed, ending results: {}", error);
            self.ended = true;
        } else if page.items.is_empty() {
            self.ended = true;
        }
        self.items.extend(page.items);
        self.next_page += 1;
        true
    }

    /// Marks the pending request as failed. Stale failures are ignored.
    pub fn fail(&mut self, token: RequestToken) -> bool {
        if self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        self.stalled = true;
        true
    }

    pub fn phase(&self) -> SearchPhase {
        if self.query.is_none() {
            return SearchPhase::Idle;
        }
        if let Some(pending) = self.pending {
            return if pending.page == FIRST_PAGE {
                SearchPhase::LoadingFirstPage
            } else {
                SearchPhase::LoadingMore
            };
        }
        if self.stalled {
            return SearchPhase::Stalled;
        }
        if self.has_more() {
            SearchPhase::Loaded
        } else {
            SearchPhase::Exhausted
        }
    }

    pub fn has_more(&self) -> bool {
        self.first_page_loaded
            && !self.ended
            && self.error.is_none()
            && (self.items.len() as u64) < self.total_results
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn items(&self) -> &[MovieSummary] {
        &self.items
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_first_page_loaded(&self) -> bool {
        self.first_page_loaded
    }

    pub fn loaded_pages(&self) -> u32 {
        if self.first_page_loaded {
            self.next_page - 1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MovieSummary {
        MovieSummary {
            poster: String::new(),
            title: format!("Title {id}"),
            media_type: "movie".to_string(),
            year: "2001".to_string(),
            imdb_id: id.to_string(),
        }
    }

    fn page(ids: &[&str], total: u64) -> SearchResultPage {
        SearchResultPage {
            items: ids.iter().map(|id| item(id)).collect(),
            total_results: total,
            error: None,
        }
    }

    #[test]
    fn starts_idle_and_blank_queries_stay_idle() {
        let mut c = SearchController::new();
        assert_eq!(c.phase(), SearchPhase::Idle);
        assert!(c.submit("   ").is_none());
        assert_eq!(c.phase(), SearchPhase::Idle);
    }

    #[test]
    fn first_page_then_more_until_exhausted() {
        let mut c = SearchController::new();
        let t1 = c.submit("batman").unwrap();
        assert_eq!(t1.page(), 1);
        assert_eq!(c.phase(), SearchPhase::LoadingFirstPage);

        assert!(c.apply(t1, page(&["tt1"], 3)));
        assert_eq!(c.phase(), SearchPhase::Loaded);
        assert!(c.has_more());
        assert_eq!(c.loaded_pages(), 1);

        let t2 = c.request_more().unwrap();
        assert_eq!(t2.page(), 2);
        assert_eq!(c.phase(), SearchPhase::LoadingMore);
        assert!(c.request_more().is_none());
        assert!(c.apply(t2, page(&["tt2"], 3)));
        assert!(c.has_more());

        let t3 = c.request_more().unwrap();
        assert_eq!(t3.page(), 3);
        assert!(c.apply(t3, page(&["tt3"], 3)));
        assert!(!c.has_more());
        assert_eq!(c.phase(), SearchPhase::Exhausted);
        assert_eq!(c.items().len(), 3);
        assert_eq!(c.loaded_pages(), 3);
        assert!(c.request_more().is_none());
    }

    #[test]
    fn late_first_page_of_old_query_is_dropped() {
        let mut c = SearchController::new();
        let old = c.submit("batman").unwrap();
        let new = c.submit("alien").unwrap();

        assert!(c.apply(new, page(&["tt9"], 1)));
        assert!(!c.apply(old, page(&["tt1", "tt2"], 50)));
        assert_eq!(c.query(), Some("alien"));
        assert_eq!(c.items()[0].imdb_id, "tt9");
        assert_eq!(c.total_results(), 1);
    }

    #[test]
    fn late_page_after_resubmission_is_dropped() {
        let mut c = SearchController::new();
        let t1 = c.submit("batman").unwrap();
        c.apply(t1, page(&["tt1"], 20));
        let more = c.request_more().unwrap();

        let fresh = c.submit("batman").unwrap();
        assert!(!c.apply(more, page(&["tt2"], 20)));
        assert_eq!(c.phase(), SearchPhase::LoadingFirstPage);
        assert!(c.items().is_empty());
        assert!(c.apply(fresh, page(&["tt1"], 20)));
        assert_eq!(c.items().len(), 1);
    }

    #[test]
    fn response_after_reset_is_dropped() {
        let mut c = SearchController::new();
        let t = c.submit("batman").unwrap();
        c.reset();
        assert!(!c.apply(t, page(&["tt1"], 1)));
        assert_eq!(c.phase(), SearchPhase::Idle);
    }

    #[test]
    fn error_response_has_no_more() {
        let mut c = SearchController::new();
        let t = c.submit("zzzz").unwrap();
        c.apply(
            t,
            SearchResultPage {
                items: Vec::new(),
                total_results: 0,
                error: Some("Movie not found!".to_string()),
            },
        );
        assert_eq!(c.error(), Some("Movie not found!"));
        assert!(!c.has_more());
        assert_eq!(c.phase(), SearchPhase::Exhausted);
    }

    #[test]
    fn error_on_later_page_keeps_loaded_results() {
        let mut c = SearchController::new();
        let t1 = c.submit("batman").unwrap();
        c.apply(t1, page(&["tt1"], 20));
        let t2 = c.request_more().unwrap();

        assert!(c.apply(
            t2,
            SearchResultPage {
                items: Vec::new(),
                total_results: 0,
                error: Some("Request limit reached!".to_string()),
            },
        ));
        assert_eq!(c.items().len(), 1);
        assert_eq!(c.total_results(), 20);
        assert!(c.error().is_none());
        assert!(!c.has_more());
        assert_eq!(c.phase(), SearchPhase::Exhausted);
        assert!(c.request_more().is_none());

        // A fresh submission starts over.
        let t1 = c.submit("batman").unwrap();
        c.apply(t1, page(&["tt1"], 20));
        assert!(c.has_more());
    }

    #[test]
    fn empty_later_page_ends_results() {
        let mut c = SearchController::new();
        let t1 = c.submit("batman").unwrap();
        c.apply(t1, page(&["tt1"], 20));
        let t2 = c.request_more().unwrap();
        c.apply(t2, page(&[], 20));
        assert_eq!(c.loaded_pages(), 2);
        assert_eq!(c.phase(), SearchPhase::Exhausted);
    }

    #[test]
    fn failure_stalls_and_more_can_be_retried() {
        let mut c = SearchController::new();
        let t1 = c.submit("batman").unwrap();
        assert!(c.fail(t1));
        assert_eq!(c.phase(), SearchPhase::Stalled);

        let t1 = c.submit("batman").unwrap();
        c.apply(t1, page(&["tt1"], 2));
        let t2 = c.request_more().unwrap();
        assert!(c.fail(t2));
        assert_eq!(c.phase(), SearchPhase::Stalled);
        assert_eq!(c.items().len(), 1);

        let retry = c.request_more().unwrap();
        assert_eq!(retry.page(), 2);
        assert!(c.apply(retry, page(&["tt2"], 2)));
        assert_eq!(c.phase(), SearchPhase::Exhausted);
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut c = SearchController::new();
        let old = c.submit("batman").unwrap();
        let _new = c.submit("alien").unwrap();
        assert!(!c.fail(old));
        assert_eq!(c.phase(), SearchPhase::LoadingFirstPage);
    }
}
