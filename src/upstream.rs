use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{ApiKey, Config};
use crate::error::{FetchError, FetchResult};
use crate::models::{NewsQuery, PageResult};

/// A response that decoded as a page, together with the bytes it came in.
#[derive(Debug, Clone)]
pub struct PageBody {
    pub page: PageResult,
    pub raw: Bytes,
}

/// Anything that can hand back one page of headlines for a query.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_page(&self, query: &NewsQuery) -> FetchResult<PageResult>;

    /// The page plus the body to relay. Sources without an original body
    /// serialize the decoded page.
    async fn fetch_body(&self, query: &NewsQuery) -> FetchResult<PageBody> {
        let page = self.fetch_page(query).await?;
        let raw = Bytes::from(serde_json::to_vec(&page)?);
        Ok(PageBody { page, raw })
    }
}

/// Client for the third-party top-headlines provider.
pub struct Upstream {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl Upstream {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("ReadyNews/1.0 (Headline Proxy)")
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> FetchResult<Self> {
        Self::new(
            config.upstream_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }
}

#[async_trait]
impl HeadlineSource for Upstream {
    async fn fetch_page(&self, query: &NewsQuery) -> FetchResult<PageResult> {
        Ok(self.fetch_body(query).await?.page)
    }

    async fn fetch_body(&self, query: &NewsQuery) -> FetchResult<PageBody> {
        info!(
            "Fetching headlines: country={} category={} page={} pageSize={}",
            query.country, query.category, query.page, query.page_size
        );

        // The key travels as a header so it never shows up in a logged URL
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.upstream_params())
            .header("X-Api-Key", self.api_key.expose())
            .send()
            .await?;

        read_body(response).await
    }
}

/// Error envelope used by both the provider and this proxy.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Check a response has a success status and a page-shaped body. The body
/// bytes are kept untouched for relaying.
pub(crate) async fn read_body(response: Response) -> FetchResult<PageBody> {
    let status = response.status();
    let raw = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&raw)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        return Err(FetchError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let page: PageResult = serde_json::from_slice(&raw)?;
    debug!(
        "Received {} articles of {} total",
        page.articles.len(),
        page.total_results
    );
    Ok(PageBody { page, raw })
}
