use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::{MovieDetail, MovieSummary, SearchResultPage};

pub const OMDB_BASE: &str = "http://www.omdbapi.com";

#[async_trait]
pub trait OmdbApi: Send + Sync {
    /// Text search. Pages are 1-based.
    async fn search(&self, query: &str, page: u32) -> Result<SearchResultPage>;
    async fn detail(&self, id: &str) -> Result<MovieDetail>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let user_agent = format!("queueup/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build OMDb HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn search_url(&self, query: &str, page: u32) -> String {
        let mut url = format!(
            "{}/?apikey={}&s={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        );
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!(
            "{}/?apikey={}&i={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(id)
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        // OMDb answers a bad key with 401 and a normal error envelope.
        if !status.is_success() && status.as_u16() != 401 {
            return Err(anyhow!("OMDb returned {} -> {}", status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<SearchResultPage> {
        debug!(query = %query, page, "OMDb search");
        let envelope: SearchEnvelope = self.get_json(&self.search_url(query, page)).await?;
        Ok(envelope.into_page())
    }

    async fn detail(&self, id: &str) -> Result<MovieDetail> {
        debug!(id = %id, "OMDb detail");
        let envelope: DetailEnvelope = self.get_json(&self.detail_url(id)).await?;
        if !envelope.response.eq_ignore_ascii_case("True") {
            return Err(anyhow!(
                "OMDb detail for '{}' failed: {}",
                id,
                envelope.error.unwrap_or_else(|| "Unknown error".to_string())
            ));
        }
        Ok(envelope.detail)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(rename = "Search", default)]
    search: Vec<MovieSummary>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

impl SearchEnvelope {
    pub(crate) fn into_page(self) -> SearchResultPage {
        let total_results = self
            .total_results
            .as_deref()
            .and_then(|t| t.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let error = match self.error {
            Some(e) => Some(e),
            None if self.response.eq_ignore_ascii_case("False") => Some("Unknown error".to_string()),
            None => None,
        };
        SearchResultPage {
            items: self.search,
            total_results,
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(flatten)]
    detail: MovieDetail,
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_from(value: serde_json::Value) -> SearchResultPage {
        let envelope: SearchEnvelope = serde_json::from_value(value).expect("envelope");
        envelope.into_page()
    }

    #[test]
    fn decodes_successful_search() {
        let page = page_from(json!({
            "Search": [{
                "Poster": "https://img.example/batman.jpg",
                "Title": "Batman",
                "Type": "movie",
                "Year": "1989",
                "imdbID": "tt1"
            }],
            "totalResults": "1",
            "Response": "True"
        }));
        assert_eq!(page.total_results, 1);
        assert_eq!(page.error, None);
        assert_eq!(page.items[0].title, "Batman");
        assert_eq!(page.items[0].imdb_id, "tt1");
    }

    #[test]
    fn decodes_error_envelope() {
        let page = page_from(json!({ "Response": "False", "Error": "Movie not found!" }));
        assert!(page.items.is_empty());
        assert_eq!(page.total_results, 0);
        assert_eq!(page.error.as_deref(), Some("Movie not found!"));
        assert!(!page.is_empty_result());
    }

    #[test]
    fn false_response_without_message_is_still_an_error() {
        let page = page_from(json!({ "Response": "False" }));
        assert_eq!(page.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn unparsable_total_is_zero() {
        let page = page_from(json!({ "Search": [], "totalResults": "lots", "Response": "True" }));
        assert_eq!(page.total_results, 0);
        assert!(page.is_empty_result());
    }

    #[test]
    fn urls_encode_query_and_omit_first_page() {
        let client = OmdbClient::new("http://omdb.test/", "k3y").unwrap();
        assert_eq!(
            client.search_url("the dark knight", 1),
            "http://omdb.test/?apikey=k3y&s=the%20dark%20knight"
        );
        assert_eq!(
            client.search_url("batman", 3),
            "http://omdb.test/?apikey=k3y&s=batman&page=3"
        );
        assert_eq!(client.detail_url("tt0096895"), "http://omdb.test/?apikey=k3y&i=tt0096895");
    }

    #[test]
    fn detail_envelope_keeps_response_flag() {
        let envelope: DetailEnvelope = serde_json::from_value(json!({
            "Title": "Batman",
            "imdbID": "tt1",
            "Response": "True"
        }))
        .unwrap();
        assert_eq!(envelope.response, "True");
        assert_eq!(envelope.detail.title, "Batman");
    }
}
