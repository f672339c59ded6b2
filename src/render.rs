use askama::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Article, Filter, DEFAULT_VIEW_PAGE_SIZE};

const SITE_NAME: &str = "ReadyNews";

/// What one article card shows. Missing text fields become empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleCard {
    pub key: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub date: String,
    pub source: String,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            key: article.url.clone(),
            title: article.title.clone().unwrap_or_default(),
            description: article.description.clone().unwrap_or_default(),
            image_url: article.url_to_image.clone().filter(|u| !u.is_empty()),
            author: article
                .author
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            date: article
                .published_at
                .as_deref()
                .map(format_date)
                .unwrap_or_default(),
            source: article.source.name.clone().unwrap_or_default(),
        }
    }
}

pub fn cards(articles: &[Article]) -> Vec<ArticleCard> {
    articles.iter().map(ArticleCard::from).collect()
}

/// RFC 3339 timestamps are shown in GMT; anything else is shown as given.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn document_title(category: &str) -> String {
    format!("{} - {}", capitalize_first(category), SITE_NAME)
}

pub fn heading(category: &str) -> String {
    format!("{} - Top {} Headlines", SITE_NAME, capitalize_first(category))
}

/// Query string of the `/more` fragment route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoreQuery {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_view_page_size")]
    pub page_size: u32,
    #[serde(default = "default_next_page")]
    pub page: u32,
    /// Articles already on screen
    #[serde(default)]
    pub loaded: usize,
}

fn default_country() -> String {
    Filter::default().country
}

fn default_category() -> String {
    Filter::default().category
}

fn default_view_page_size() -> u32 {
    DEFAULT_VIEW_PAGE_SIZE
}

fn default_next_page() -> u32 {
    2
}

impl MoreQuery {
    pub fn filter(&self) -> Filter {
        Filter::new(self.country.clone(), self.category.clone(), self.page_size)
    }
}

/// Link for the loader that fetches the page after `page`, or `None` once
/// everything the provider reported is on screen.
pub fn next_link(filter: &Filter, page: u32, loaded: usize, total: u64) -> Option<String> {
    if loaded as u64 >= total {
        return None;
    }

    let query = MoreQuery {
        country: filter.country.clone(),
        category: filter.category.clone(),
        page_size: filter.page_size,
        page: page.checked_add(1)?,
        loaded,
    };
    serde_urlencoded::to_string(&query)
        .ok()
        .map(|qs| format!("/more?{}", qs))
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct NewsPageTemplate {
    pub document_title: String,
    pub heading: String,
    pub cards: Vec<ArticleCard>,
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "articles.html")]
pub struct ArticlesTemplate {
    pub cards: Vec<ArticleCard>,
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
}
