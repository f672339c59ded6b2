use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::error::FetchResult;
use crate::models::{NewsQuery, PageResult};
use crate::upstream::{read_body, HeadlineSource, PageBody};

/// Talks to a running proxy's `/news` route on behalf of a list controller.
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("ReadyNews/1.0 (List Client)")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> FetchResult<Self> {
        Self::new(
            config.backend_url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }

    pub fn news_url(&self) -> String {
        format!("{}/news", self.base_url)
    }
}

#[async_trait]
impl HeadlineSource for ProxyClient {
    async fn fetch_page(&self, query: &NewsQuery) -> FetchResult<PageResult> {
        Ok(self.fetch_body(query).await?.page)
    }

    async fn fetch_body(&self, query: &NewsQuery) -> FetchResult<PageBody> {
        info!(
            "Requesting page {} of {}/{} from proxy",
            query.page, query.country, query.category
        );

        let response = self
            .client
            .get(self.news_url())
            .query(&query.upstream_params())
            .send()
            .await?;

        read_body(response).await
    }
}
