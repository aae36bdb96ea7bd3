// HTTP request handlers
use crate::domain::dashboard::Page;
use crate::infrastructure::event_stream::sse_response;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::render::{render_not_found, render_page};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// The landing route shows today's weather
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    page_html(&state, Page::CurrentWeather)
}

pub async fn page(Path(slug): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match Page::from_slug(&slug) {
        Some(page) => page_html(&state, page),
        None => not_found_page(&state),
    }
}

/// Latest snapshot as JSON
pub async fn page_snapshot(
    Path(slug): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(page) = Page::from_slug(&slug) else {
        return not_found_page(&state);
    };

    let snapshot = state.feeds.latest(page);
    match json_response(&snapshot, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Live snapshots for a page as server-sent events
pub async fn page_stream(Path(slug): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match Page::from_slug(&slug) {
        Some(page) => {
            tracing::debug!("Opening event stream for {}", page.slug());
            sse_response(state.feeds.subscribe(page)).into_response()
        }
        None => not_found_page(&state),
    }
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    not_found_page(&state)
}

fn page_html(state: &AppState, page: Page) -> Response {
    let snapshot = state.feeds.latest(page);
    Html(render_page(&state.title, &snapshot, state.intervals.interval(page))).into_response()
}

fn not_found_page(state: &AppState) -> Response {
    (StatusCode::NOT_FOUND, Html(render_not_found(&state.title))).into_response()
}
