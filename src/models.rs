use serde::{Deserialize, Serialize};

/// One search hit, and the unit stored on the watchlist.
///
/// Field names follow OMDb so stored entries and API payloads share one shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MovieSummary {
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Type", default)]
    pub media_type: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RatingPair {
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Value", default)]
    pub value: String,
}

/// Full record returned by the detail lookup. Never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MovieDetail {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Rated")]
    pub rated: String,
    #[serde(rename = "Released")]
    pub released: String,
    #[serde(rename = "Runtime")]
    pub runtime: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Writer")]
    pub writer: String,
    #[serde(rename = "Actors")]
    pub actors: String,
    #[serde(rename = "Plot")]
    pub plot: String,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Awards")]
    pub awards: String,
    #[serde(rename = "Poster")]
    pub poster: String,
    #[serde(rename = "Ratings")]
    pub ratings: Vec<RatingPair>,
    #[serde(rename = "Metascore")]
    pub metascore: String,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: String,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub media_type: String,
    #[serde(rename = "DVD")]
    pub dvd: String,
    #[serde(rename = "BoxOffice")]
    pub box_office: String,
    #[serde(rename = "Production")]
    pub production: String,
    #[serde(rename = "Website")]
    pub website: String,
}

/// Rating slots in the order OMDb reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSlot {
    Audience,
    Critics,
    Aggregate,
}

impl RatingSlot {
    fn index(self) -> usize {
        match self {
            RatingSlot::Audience => 0,
            RatingSlot::Critics => 1,
            RatingSlot::Aggregate => 2,
        }
    }

    pub fn source_label(self) -> &'static str {
        match self {
            RatingSlot::Audience => "IMDB",
            RatingSlot::Critics => "Rotten Tomatoes",
            RatingSlot::Aggregate => "Metacritic",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            RatingSlot::Audience => "Audience Rating",
            RatingSlot::Critics => "Tomatometer",
            RatingSlot::Aggregate => "Metascore",
        }
    }
}

impl MovieDetail {
    pub fn rating(&self, slot: RatingSlot) -> Option<&RatingPair> {
        self.ratings.get(slot.index())
    }

    /// Display score for a slot: `7.5/10` -> `7.5`, `94%` -> `94%`, `72/100` -> `72`.
    pub fn rating_score(&self, slot: RatingSlot) -> Option<String> {
        let value = self.rating(slot)?.value.trim();
        let score = match slot {
            RatingSlot::Critics => value,
            RatingSlot::Audience | RatingSlot::Aggregate => {
                value.split('/').next().unwrap_or(value).trim()
            }
        };
        if score.is_empty() {
            None
        } else {
            Some(score.to_string())
        }
    }

    /// OMDb reports a missing box office as `N/A`.
    pub fn box_office(&self) -> Option<&str> {
        let value = self.box_office.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("N/A") {
            None
        } else {
            Some(value)
        }
    }

    /// The summary to toggle onto the watchlist from the detail view.
    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            poster: self.poster.clone(),
            title: self.title.clone(),
            media_type: self.media_type.clone(),
            year: self.year.clone(),
            imdb_id: self.imdb_id.clone(),
        }
    }
}

/// One page of search results, after the API's string-typed envelope is decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResultPage {
    pub items: Vec<MovieSummary>,
    pub total_results: u64,
    pub error: Option<String>,
}

impl SearchResultPage {
    pub fn is_empty_result(&self) -> bool {
        self.error.is_none() && self.total_results == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail_with(ratings: serde_json::Value) -> MovieDetail {
        serde_json::from_value(json!({
            "Title": "Batman",
            "Year": "1989",
            "imdbID": "tt0096895",
            "Ratings": ratings,
            "BoxOffice": "N/A"
        }))
        .expect("detail deserialize")
    }

    #[test]
    fn missing_rating_slots_are_none() {
        let detail = detail_with(json!([{ "Source": "Internet Movie Database", "Value": "7.5/10" }]));
        assert_eq!(detail.rating_score(RatingSlot::Audience).as_deref(), Some("7.5"));
        assert_eq!(detail.rating_score(RatingSlot::Critics), None);
        assert_eq!(detail.rating_score(RatingSlot::Aggregate), None);
    }

    #[test]
    fn all_rating_slots_are_trimmed_per_source() {
        let detail = detail_with(json!([
            { "Source": "Internet Movie Database", "Value": "7.5/10" },
            { "Source": "Rotten Tomatoes", "Value": "77%" },
            { "Source": "Metacritic", "Value": "69/100" }
        ]));
        assert_eq!(detail.rating_score(RatingSlot::Audience).as_deref(), Some("7.5"));
        assert_eq!(detail.rating_score(RatingSlot::Critics).as_deref(), Some("77%"));
        assert_eq!(detail.rating_score(RatingSlot::Aggregate).as_deref(), Some("69"));
    }

    #[test]
    fn detail_tolerates_missing_fields() {
        let detail: MovieDetail = serde_json::from_value(json!({ "imdbID": "tt1" })).unwrap();
        assert!(detail.ratings.is_empty());
        assert_eq!(detail.box_office(), None);
        assert_eq!(detail.summary().imdb_id, "tt1");
    }

    #[test]
    fn summary_requires_an_id() {
        let res: Result<MovieSummary, _> = serde_json::from_value(json!({ "Title": "No id" }));
        assert!(res.is_err());
    }
}
