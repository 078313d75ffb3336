//! Query OMDb and print the decoded search page or detail record.
//! Usage:
//!   cargo run --bin omdb_props -- search <query> [page]
//!   cargo run --bin omdb_props -- detail <imdb_id>
//! Reads OMDB_API_KEY (and optionally OMDB_BASE_URL) from the environment (.env supported).

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use queueup::models::RatingSlot;
use queueup::omdb::{OmdbApi, OmdbClient, OMDB_BASE};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let api_key = env::var("OMDB_API_KEY").context("Missing OMDB_API_KEY in environment")?;
    let base = env::var("OMDB_BASE_URL").unwrap_or_else(|_| OMDB_BASE.to_string());
    let client = OmdbClient::new(base, api_key)?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("search") => {
            let query = args.get(1).context("search needs a query")?;
            let page = match args.get(2) {
                Some(p) => p.parse().context("page must be a number")?,
                None => 1,
            };
            let result = client.search(query, page).await?;
            println!("totalResults: {}", result.total_results);
            if let Some(err) = &result.error {
                println!("Error: {}", err);
            }
            for item in &result.items {
                println!("{}\t{} ({})\t{}", item.imdb_id, item.title, item.year, item.media_type);
            }
        }
        Some("detail") => {
            let id = args.get(1).context("detail needs an imdb id")?;
            let detail = client.detail(id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
            for slot in [RatingSlot::Audience, RatingSlot::Critics, RatingSlot::Aggregate] {
                println!(
                    "{}: {}",
                    slot.caption(),
                    detail.rating_score(slot).unwrap_or_else(|| "n/a".to_string())
                );
            }
        }
        _ => bail!("usage: omdb_props search <query> [page] | detail <imdb_id>"),
    }

    Ok(())
}
