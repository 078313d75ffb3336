use std::collections::HashSet;

use crate::models::MovieSummary;

pub const REVEAL_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
    Ignored,
}

/// Adds `summary` if no entry shares its id, otherwise drops every entry that does.
pub fn toggle(mut entries: Vec<MovieSummary>, summary: &MovieSummary) -> (Vec<MovieSummary>, Toggled) {
    if summary.imdb_id.trim().is_empty() {
        return (entries, Toggled::Ignored);
    }
    if entries.iter().all(|e| e.imdb_id != summary.imdb_id) {
        entries.push(summary.clone());
        (entries, Toggled::Added)
    } else {
        entries.retain(|e| e.imdb_id != summary.imdb_id);
        (entries, Toggled::Removed)
    }
}

pub fn ids(entries: &[MovieSummary]) -> HashSet<String> {
    entries.iter().map(|e| e.imdb_id.clone()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Unsorted,
    OldestFirst,
    NewestFirst,
    TitleAsc,
    TitleDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::NewestFirst,
        SortMode::OldestFirst,
        SortMode::TitleAsc,
        SortMode::TitleDesc,
    ];

    /// Unknown values fall back to insertion order.
    pub fn parse(value: &str) -> Self {
        match value {
            "oldest-first" => SortMode::OldestFirst,
            "newest-first" => SortMode::NewestFirst,
            "a-z" => SortMode::TitleAsc,
            "z-a" => SortMode::TitleDesc,
            _ => SortMode::Unsorted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Unsorted => "choose-filter",
            SortMode::OldestFirst => "oldest-first",
            SortMode::NewestFirst => "newest-first",
            SortMode::TitleAsc => "a-z",
            SortMode::TitleDesc => "z-a",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Unsorted => "Choose a filter",
            SortMode::OldestFirst => "Oldest First",
            SortMode::NewestFirst => "Newest First",
            SortMode::TitleAsc => "A-Z",
            SortMode::TitleDesc => "Z-A",
        }
    }

    pub fn apply(self, mut entries: Vec<MovieSummary>) -> Vec<MovieSummary> {
        match self {
            SortMode::Unsorted | SortMode::OldestFirst => {}
            SortMode::NewestFirst => entries.reverse(),
            SortMode::TitleAsc => entries.sort_by_cached_key(|e| e.title.to_lowercase()),
            SortMode::TitleDesc => {
                entries.sort_by_cached_key(|e| e.title.to_lowercase());
                entries.reverse();
            }
        }
        entries
    }
}

/// The watchlist as one render sees it: sorted, with only the first `reveal` shown.
#[derive(Debug, Clone)]
pub struct WatchlistView {
    sorted: Vec<MovieSummary>,
    sort: SortMode,
    reveal: usize,
}

impl WatchlistView {
    pub fn new(entries: Vec<MovieSummary>, sort: SortMode, reveal: usize) -> Self {
        Self {
            sorted: sort.apply(entries),
            sort,
            reveal: reveal.max(REVEAL_STEP),
        }
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn reveal(&self) -> usize {
        self.reveal
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn visible(&self) -> &[MovieSummary] {
        &self.sorted[..self.reveal.min(self.sorted.len())]
    }

    pub fn has_more(&self) -> bool {
        self.reveal < self.sorted.len()
    }

    pub fn next_reveal(&self) -> usize {
        self.reveal + REVEAL_STEP
    }
}
