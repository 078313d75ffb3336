use crate::config::Config;
use crate::context::{AppContext, SearchQueryState};
use crate::models::MovieSummary;
use crate::omdb::{OmdbApi, OmdbClient};
use crate::store::{FileStore, WatchlistStore};
use crate::views;
use crate::watchlist::{SortMode, WatchlistView, REVEAL_STEP};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 16 * 1024; // toggle forms are tiny

#[derive(Clone)]
pub struct AppState {
    pub omdb: Arc<dyn OmdbApi>,
    pub context: Arc<AppContext>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let omdb: Arc<dyn OmdbApi> = Arc::new(OmdbClient::new(
        config.omdb_base_url.clone(),
        config.omdb_api_key.clone(),
    )?);
    let file_store = FileStore::open(&config.data_dir)?;
    info!("Watchlist stored under {}", file_store.dir().display());
    let context = Arc::new(AppContext::new(WatchlistStore::new(Arc::new(file_store))));

    let app = build_router(AppState { omdb, context });

    info!("Listening on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/watchlist", get(watchlist_view))
        .route("/watchlist/toggle", post(toggle_watchlist))
        .route("/movies/:id", get(movie_detail))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct HomeParams {
    q: Option<String>,
    pages: Option<String>,
}

async fn home(State(state): State<AppState>, Query(params): Query<HomeParams>) -> Html<String> {
    let pages = parse_count(params.pages.as_deref()).unwrap_or(1);
    let query = SearchQueryState::new(params.q.unwrap_or_default(), pages as u32);
    let snapshot = state.context.search(state.omdb.as_ref(), &query).await;
    let ids = state.context.watchlist_ids().await;
    Html(views::render_home(&query, &snapshot, &ids))
}

#[derive(Debug, Deserialize)]
struct WatchlistParams {
    sort: Option<String>,
    reveal: Option<String>,
}

async fn watchlist_view(
    State(state): State<AppState>,
    Query(params): Query<WatchlistParams>,
) -> Html<String> {
    let sort = params
        .sort
        .as_deref()
        .map(SortMode::parse)
        .unwrap_or_default();
    let reveal = parse_count(params.reveal.as_deref()).unwrap_or(REVEAL_STEP);
    // Re-read every render so toggles from other views always show.
    let view = WatchlistView::new(state.context.stored_watchlist(), sort, reveal);
    let search_path = state.context.search_state().await.to_path();
    Html(views::render_watchlist(&view, &search_path))
}

#[derive(Debug, Deserialize)]
struct DetailParams {
    back: Option<String>,
}

async fn movie_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Html<String> {
    let back = views::local_path(params.back.as_deref());
    let search_path = state.context.search_state().await.to_path();
    let detail = match state.omdb.detail(&id).await {
        Ok(detail) => Some(detail),
        Err(e) => {
            warn!("Failed to load details for {}: {:#}", id, e);
            None
        }
    };
    let on_watchlist = state.context.is_on_watchlist(&id).await;
    Html(views::render_detail(
        &id,
        detail.as_ref(),
        &back,
        on_watchlist,
        &search_path,
    ))
}

#[derive(Debug, Deserialize)]
struct ToggleForm {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Type", default)]
    media_type: String,
    #[serde(rename = "Poster", default)]
    poster: String,
    return_to: Option<String>,
}

async fn toggle_watchlist(State(state): State<AppState>, Form(form): Form<ToggleForm>) -> Redirect {
    let summary = MovieSummary {
        poster: form.poster,
        title: form.title,
        media_type: form.media_type,
        year: form.year,
        imdb_id: form.imdb_id.trim().to_string(),
    };
    if let Err(e) = state.context.toggle(&summary).await {
        error!("Failed to persist watchlist toggle for {}: {:#}", summary.imdb_id, e);
    }
    Redirect::to(&views::local_path(form.return_to.as_deref()))
}

fn parse_count(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .map(|v| v.min(1_000))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
