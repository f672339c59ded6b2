use std::collections::HashSet;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::controller::{first_sighting, ListController};
use crate::error::FetchError;
use crate::models::{Filter, NewsQuery, DEFAULT_VIEW_PAGE_SIZE};
use crate::render::{
    self, next_link, ArticlesTemplate, ErrorTemplate, MoreQuery, NewsPageTemplate,
};
use crate::upstream::HeadlineSource;

/// The only message a client ever sees when the provider can't be reached.
pub const FETCH_FAILED: &str = "Failed to fetch news";

pub struct AppState {
    pub source: Arc<dyn HeadlineSource>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/more", get(more))
        .route("/news", get(news))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Upstream failure on the JSON route. The cause is logged, never returned.
pub struct AppError(FetchError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Error fetching from upstream: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": FETCH_FAILED })),
        )
            .into_response()
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError(err)
    }
}

/// Upstream failure on an HTML route.
pub struct ViewError(FetchError);

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        error!("Error fetching headlines for view: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            HtmlTemplate(ErrorTemplate {
                message: FETCH_FAILED.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<FetchError> for ViewError {
    fn from(err: FetchError) -> Self {
        ViewError(err)
    }
}

// Route handlers

/// Relays the provider's body as received once it has decoded as a page.
pub async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Response, AppError> {
    let body = state.source.fetch_body(&query).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body.raw).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ViewQuery {
    pub fn filter(&self) -> Filter {
        let defaults = Filter::default();
        Filter::new(
            self.country.clone().unwrap_or(defaults.country),
            self.category.clone().unwrap_or(defaults.category),
            self.page_size.unwrap_or(DEFAULT_VIEW_PAGE_SIZE),
        )
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ViewError> {
    let filter = query.filter();
    let mut list = ListController::new(filter.clone());
    list.initial_load(state.source.as_ref()).await?;

    let loaded = list.articles().len();
    let next = if list.wants_more(loaded) {
        next_link(&filter, list.page(), loaded, list.total_results())
    } else {
        None
    };

    Ok(HtmlTemplate(NewsPageTemplate {
        document_title: render::document_title(&filter.category),
        heading: render::heading(&filter.category),
        cards: render::cards(list.articles()),
        next,
    }))
}

pub async fn more(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MoreQuery>,
) -> Result<impl IntoResponse, ViewError> {
    let filter = query.filter();
    let mut page = state.source.fetch_page(&filter.query(query.page)).await?;

    // Earlier pages are not known here, so duplicates only drop within a page
    let mut seen = HashSet::new();
    page.articles.retain(|article| first_sighting(&mut seen, article));

    let room = usize::try_from(page.total_results.saturating_sub(query.loaded as u64))
        .unwrap_or(usize::MAX);
    page.articles.truncate(room);

    let loaded = query.loaded + page.articles.len();
    let next = if page.articles.is_empty() {
        None
    } else {
        next_link(&filter, query.page, loaded, page.total_results)
    };

    Ok(HtmlTemplate(ArticlesTemplate {
        cards: render::cards(&page.articles),
        next,
    }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
