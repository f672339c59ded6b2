use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page size used by the list view when none is given.
pub const DEFAULT_VIEW_PAGE_SIZE: u32 = 9;

/// Filter parameters accepted by `/news` and forwarded upstream verbatim.
///
/// Values are kept as the client sent them, numeric or not; the provider
/// decides what is valid. Anything else in the query string (an `apiKey` in
/// particular) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_page")]
    pub page: String,
    #[serde(default = "default_page_size")]
    pub page_size: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_page() -> String {
    "1".to_string()
}

fn default_page_size() -> String {
    DEFAULT_PAGE_SIZE.to_string()
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            country: default_country(),
            category: default_category(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl NewsQuery {
    /// The exact parameter list sent to the upstream provider.
    pub fn upstream_params(&self) -> [(&'static str, String); 4] {
        [
            ("country", self.country.clone()),
            ("category", self.category.clone()),
            ("page", self.page.clone()),
            ("pageSize", self.page_size.clone()),
        ]
    }
}

/// The filter a list session runs under. Owned by whoever drives the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub country: String,
    pub category: String,
    pub page_size: u32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            country: default_country(),
            category: default_category(),
            page_size: DEFAULT_VIEW_PAGE_SIZE,
        }
    }
}

impl Filter {
    pub fn new(country: impl Into<String>, category: impl Into<String>, page_size: u32) -> Self {
        Self {
            country: country.into(),
            category: category.into(),
            page_size,
        }
    }

    pub fn query(&self, page: u32) -> NewsQuery {
        NewsQuery {
            country: self.country.clone(),
            category: self.category.clone(),
            page: page.to_string(),
            page_size: self.page_size.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Empty when the provider sends none
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One upstream response. Shared by the proxy and its clients so the shape
/// can't drift between them; unknown top-level keys survive the round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub articles: Vec<Article>,
    pub total_results: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod news_query_tests {
        use super::*;

        #[test]
        fn test_defaults_from_empty_query() {
            let query: NewsQuery = serde_urlencoded::from_str("").unwrap();
            assert_eq!(query, NewsQuery::default());
            assert_eq!(query.country, "us");
            assert_eq!(query.category, "general");
            assert_eq!(query.page, "1");
            assert_eq!(query.page_size, "10");
        }

        #[test]
        fn test_camel_case_page_size() {
            let query: NewsQuery =
                serde_urlencoded::from_str("country=gb&category=sports&page=3&pageSize=20")
                    .unwrap();
            assert_eq!(query.country, "gb");
            assert_eq!(query.category, "sports");
            assert_eq!(query.page, "3");
            assert_eq!(query.page_size, "20");
        }

        #[test]
        fn test_client_api_key_is_ignored() {
            let query: NewsQuery =
                serde_urlencoded::from_str("country=in&apiKey=stolen").unwrap();
            let params = query.upstream_params();
            assert!(params.iter().all(|(k, _)| *k != "apiKey"));
            assert!(params.iter().all(|(_, v)| v != "stolen"));
        }

        #[test]
        fn test_unvalidated_strings_pass_through() {
            let query: NewsQuery =
                serde_urlencoded::from_str("country=zz&category=not-a-category").unwrap();
            let params = query.upstream_params();
            assert_eq!(params[0], ("country", "zz".to_string()));
            assert_eq!(params[1], ("category", "not-a-category".to_string()));
        }

        #[test]
        fn test_non_numeric_page_passes_through() {
            let query: NewsQuery = serde_urlencoded::from_str("page=two&pageSize=-1").unwrap();
            let params = query.upstream_params();
            assert_eq!(params[2], ("page", "two".to_string()));
            assert_eq!(params[3], ("pageSize", "-1".to_string()));
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_default_filter_uses_view_page_size() {
            let filter = Filter::default();
            assert_eq!(filter.page_size, 9);
            assert_eq!(filter.category, "general");
        }

        #[test]
        fn test_query_for_page() {
            let filter = Filter::new("us", "sports", 9);
            let query = filter.query(4);
            assert_eq!(query.page, "4");
            assert_eq!(query.page_size, "9");
            assert_eq!(query.category, "sports");
        }
    }

    mod page_result_tests {
        use super::*;

        #[test]
        fn test_parse_newsapi_shape() {
            let body = json!({
                "status": "ok",
                "totalResults": 2,
                "articles": [
                    {
                        "source": {"id": null, "name": "Example"},
                        "author": "Jane",
                        "title": "Headline",
                        "description": null,
                        "url": "https://example.com/a",
                        "urlToImage": "https://example.com/a.jpg",
                        "publishedAt": "2024-12-09T12:00:00Z",
                        "content": "Body"
                    },
                    {
                        "source": {"name": "Other"},
                        "url": "https://example.com/b"
                    }
                ]
            });

            let page: PageResult = serde_json::from_value(body).unwrap();
            assert_eq!(page.total_results, 2);
            assert_eq!(page.articles.len(), 2);
            assert_eq!(page.articles[0].title.as_deref(), Some("Headline"));
            assert_eq!(page.articles[0].description, None);
            assert_eq!(page.articles[1].title, None);
            assert_eq!(page.articles[1].source.name.as_deref(), Some("Other"));
            assert_eq!(page.extra.get("status"), Some(&json!("ok")));
        }

        #[test]
        fn test_unknown_keys_survive_reserialization() {
            let body = json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [{"url": "https://example.com/a", "sentiment": 0.4}]
            });

            let page: PageResult = serde_json::from_value(body).unwrap();
            let out = serde_json::to_value(&page).unwrap();
            assert_eq!(out["status"], "ok");
            assert_eq!(out["totalResults"], 1);
            assert_eq!(out["articles"][0]["sentiment"], 0.4);
            assert_eq!(out["articles"][0]["url"], "https://example.com/a");
        }

        #[test]
        fn test_null_url_and_source_accepted() {
            let body = json!({
                "totalResults": 1,
                "articles": [{"title": "T", "url": null, "source": null}]
            });

            let page: PageResult = serde_json::from_value(body).unwrap();
            assert_eq!(page.articles[0].url, "");
            assert_eq!(page.articles[0].source, Source::default());
        }

        #[test]
        fn test_missing_total_is_malformed() {
            let body = json!({"articles": []});
            assert!(serde_json::from_value::<PageResult>(body).is_err());
        }
    }
}
