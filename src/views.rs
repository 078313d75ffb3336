//! Server-rendered HTML for the three views.

use std::collections::HashSet;
use std::fmt::Write;

use crate::context::{SearchQueryState, SearchSnapshot};
use crate::models::{MovieDetail, MovieSummary, RatingSlot};
use crate::search::SearchPhase;
use crate::watchlist::{SortMode, WatchlistView};

pub const WATCHLIST_PATH: &str = "/watchlist";

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn results_info(count: u64) -> String {
    match count {
        0 => String::new(),
        1 => "1 result found".to_string(),
        n => format!("{n} results found"),
    }
}

/// Only same-site absolute paths are followed; anything else goes home.
pub fn local_path(candidate: Option<&str>) -> String {
    match candidate {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('\\') => p.to_string(),
        _ => "/".to_string(),
    }
}

pub fn detail_href(id: &str, back: &str) -> String {
    format!(
        "/movies/{}?back={}",
        urlencoding::encode(id),
        urlencoding::encode(back)
    )
}

fn page(title: &str, search_path: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title} | QueueUp</title></head>\n<body>\n\
         <nav><a href=\"/\">QueueUp</a> <a href=\"{search}\">Search</a> <a href=\"{WATCHLIST_PATH}\">Watchlist</a></nav>\n\
         {body}\n</body>\n</html>\n",
        title = escape(title),
        search = escape(search_path),
    )
}

fn no_results(text: &str) -> String {
    format!("<h2 class=\"no-results\">{text}</h2>")
}

fn toggle_form(summary: &MovieSummary, on_watchlist: bool, return_to: &str) -> String {
    let label = if on_watchlist {
        "On watchlist"
    } else {
        "Add to watchlist"
    };
    let state = if on_watchlist { "filled" } else { "unfilled" };
    format!(
        "<form method=\"post\" action=\"/watchlist/toggle\">\
         <input type=\"hidden\" name=\"imdbID\" value=\"{id}\">\
         <input type=\"hidden\" name=\"Title\" value=\"{title}\">\
         <input type=\"hidden\" name=\"Year\" value=\"{year}\">\
         <input type=\"hidden\" name=\"Type\" value=\"{kind}\">\
         <input type=\"hidden\" name=\"Poster\" value=\"{poster}\">\
         <input type=\"hidden\" name=\"return_to\" value=\"{ret}\">\
         <button type=\"submit\" class=\"watchlist-toggle {state}\">{label}</button></form>",
        id = escape(&summary.imdb_id),
        title = escape(&summary.title),
        year = escape(&summary.year),
        kind = escape(&summary.media_type),
        poster = escape(&summary.poster),
        ret = escape(return_to),
    )
}

pub fn render_home(
    state: &SearchQueryState,
    snapshot: &SearchSnapshot,
    watchlist_ids: &HashSet<String>,
) -> String {
    let here = state.to_path();
    let mut body = String::new();
    let _ = write!(
        body,
        "<header><h1>Find Movies and TV</h1>\
         <form method=\"get\" action=\"/\"><label for=\"query\">Search</label>\
         <input id=\"query\" type=\"text\" name=\"q\" value=\"{}\" placeholder=\"Search for a movie...\">\
         <button type=\"submit\">Search</button></form>",
        escape(&state.query)
    );
    let info = if snapshot.error.is_some() {
        String::new()
    } else {
        results_info(snapshot.total_results)
    };
    let _ = write!(body, "<p class=\"results-info\">{}</p></header>\n<main>", info);

    match snapshot.phase {
        SearchPhase::Idle => body.push_str(&no_results("Your next watch is just around the corner.")),
        SearchPhase::LoadingFirstPage => body.push_str("<p class=\"loading\">Loading...</p>"),
        SearchPhase::Stalled if !snapshot.first_page_loaded => {
            let _ = write!(
                body,
                "<p class=\"loading\">Loading...</p><a href=\"{}\">Try again</a>",
                escape(&here)
            );
        }
        _ => {
            if let Some(error) = &snapshot.error {
                body.push_str(&no_results(&format!("Oh no! {}", escape(error))));
            } else if snapshot.total_results == 0 {
                body.push_str(&no_results("Oh no! There’s nothing here for you."));
            } else {
                body.push_str(&result_list(state, snapshot, watchlist_ids, &here));
            }
        }
    }
    body.push_str("</main>");
    page("Search", &here, &body)
}

fn result_list(
    state: &SearchQueryState,
    snapshot: &SearchSnapshot,
    watchlist_ids: &HashSet<String>,
    here: &str,
) -> String {
    let mut out = String::from("<section class=\"results\">");
    for item in &snapshot.items {
        let on_watchlist = watchlist_ids.contains(&item.imdb_id);
        let _ = write!(
            out,
            "<article class=\"card\" id=\"{id}\">\
             <a href=\"{href}\"><img src=\"{poster}\" alt=\"Poster for {title}\">\
             <h2>{title} ({year})</h2></a>{toggle}</article>",
            id = escape(&item.imdb_id),
            href = escape(&detail_href(&item.imdb_id, here)),
            poster = escape(&item.poster),
            title = escape(&item.title),
            year = escape(&item.year),
            toggle = toggle_form(item, on_watchlist, here),
        );
    }
    match snapshot.phase {
        SearchPhase::Loaded | SearchPhase::Stalled => {
            let next = state.with_pages(snapshot.loaded_pages + 1);
            let _ = write!(
                out,
                "<a class=\"load-more\" href=\"{}\">Load more</a>",
                escape(&next.to_path())
            );
        }
        SearchPhase::LoadingMore => out.push_str("<p class=\"loading\">Loading...</p>"),
        _ => out.push_str("<p class=\"end\">End of results.</p>"),
    }
    out.push_str("</section>");
    out
}

pub fn render_watchlist(view: &WatchlistView, search_path: &str) -> String {
    let mut body = String::from("<header><h1>Watchlist</h1><form method=\"get\" action=\"/watchlist\">");
    body.push_str("<label for=\"filter\">Filter</label><select name=\"sort\" id=\"filter\">");
    let _ = write!(
        body,
        "<option value=\"{}\" disabled{}>{}</option>",
        SortMode::Unsorted.as_str(),
        if view.sort() == SortMode::Unsorted { " selected" } else { "" },
        SortMode::Unsorted.label()
    );
    for mode in SortMode::ALL {
        let _ = write!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            mode.as_str(),
            if view.sort() == mode { " selected" } else { "" },
            mode.label()
        );
    }
    let _ = write!(
        body,
        "</select><button type=\"submit\">Apply</button></form>\
         <p class=\"results-info\">{}</p></header>\n<main>",
        results_info(view.len() as u64)
    );

    if view.is_empty() {
        body.push_str(
            "<h2 class=\"no-results\">Nothing here just yet.<br>\
             <a href=\"/\">Start searching for movies now.</a></h2>",
        );
    } else {
        body.push_str("<section class=\"posters\">");
        for entry in view.visible() {
            let _ = write!(
                body,
                "<a class=\"poster\" href=\"{href}\"><img src=\"{poster}\" alt=\"Poster for {title}\"></a>",
                href = escape(&detail_href(&entry.imdb_id, WATCHLIST_PATH)),
                poster = escape(&entry.poster),
                title = escape(&entry.title),
            );
        }
        body.push_str("</section>");
        if view.has_more() {
            let _ = write!(
                body,
                "<a class=\"load-more\" href=\"{}\">Load more</a>",
                escape(&watchlist_path(view.sort(), view.next_reveal()))
            );
        } else {
            body.push_str("<p class=\"end\">End of watchlist.</p>");
        }
    }
    body.push_str("</main>");
    page("Watchlist", search_path, &body)
}

pub fn watchlist_path(sort: SortMode, reveal: usize) -> String {
    format!("{WATCHLIST_PATH}?sort={}&reveal={reveal}", sort.as_str())
}

pub fn render_detail(
    id: &str,
    detail: Option<&MovieDetail>,
    back: &str,
    on_watchlist: bool,
    search_path: &str,
) -> String {
    let Some(detail) = detail else {
        return page("Loading", search_path, "<main><p class=\"loading\">Loading...</p></main>");
    };
    let back_text = if back.starts_with(WATCHLIST_PATH) {
        "watchlist"
    } else {
        "results"
    };
    let here = detail_href(id, back);
    let mut summary = detail.summary();
    if summary.imdb_id.is_empty() {
        summary.imdb_id = id.to_string();
    }

    let mut body = String::new();
    let _ = write!(
        body,
        "<a class=\"back\" href=\"{}\">Back to {}</a>\n<main>",
        escape(back),
        back_text
    );
    let _ = write!(
        body,
        "<section><img src=\"{poster}\" alt=\"Poster for {title}\"><div><h1>{title}</h1>\
         <p class=\"meta\"><span>{year}</span> <span>{runtime}</span> <span>{rated}</span></p>\
         <p>{genre}</p><p>Starring: {actors}</p>{toggle}</div></section>",
        poster = escape(&detail.poster),
        title = escape(&detail.title),
        year = escape(&detail.year),
        runtime = escape(&detail.runtime),
        rated = escape(&detail.rated),
        genre = escape(&detail.genre),
        actors = escape(&detail.actors),
        toggle = toggle_form(&summary, on_watchlist, &here),
    );
    let _ = write!(
        body,
        "<section><h2>Synopsis</h2><p>{}</p></section><section class=\"ratings\">",
        escape(&detail.plot)
    );
    for slot in [RatingSlot::Audience, RatingSlot::Critics, RatingSlot::Aggregate] {
        let score = detail
            .rating_score(slot)
            .map(|s| escape(&s))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = write!(
            body,
            "<article><h2>{}</h2><p><span class=\"score\">{}</span> {}</p></article>",
            slot.source_label(),
            score,
            slot.caption()
        );
    }
    body.push_str("</section><section><h2>Details</h2><ul>");
    let _ = write!(body, "<li>Written By: {}</li>", escape(&detail.writer));
    if let Some(box_office) = detail.box_office() {
        let _ = write!(body, "<li>Domestic Box Office: {}</li>", escape(box_office));
    }
    let _ = write!(body, "<li>Awards: {}</li></ul></section></main>", escape(&detail.awards));
    page(&detail.title, search_path, &body)
}
