use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::KudaGoProviderConfig;
use crate::core::{EventsPage, EventsPageProvider, PageQuery};

const TEXT_FORMAT: &str = "text";
const FIELDS: &str = "id,title,price,is_free,dates";

// KudaGo public API client for single event pages
pub struct KudaGoProvider {
    client: reqwest::Client,
    events_url: String,
}

impl KudaGoProvider {
    pub fn new(config: &KudaGoProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eventfx/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            events_url: format!("{}{}", config.base_url, config.events_path),
        })
    }

    fn page_url(&self, query: &PageQuery) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &self.events_url,
            &[
                ("actual_since", query.window.from.to_string()),
                ("actual_until", query.window.to.to_string()),
                ("page", query.page.to_string()),
                ("page_size", query.page_size.to_string()),
                ("text_format", TEXT_FORMAT.to_string()),
                ("fields", FIELDS.to_string()),
            ],
        )
        .with_context(|| format!("Invalid events URL: {}", self.events_url))
    }
}

#[async_trait]
impl EventsPageProvider for KudaGoProvider {
    #[instrument(name = "KudaGoPageFetch", skip(self, query), fields(page = query.page))]
    async fn fetch_page(&self, query: &PageQuery) -> Result<EventsPage> {
        let url = self.page_url(query)?;
        debug!("Requesting events from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for page: {}", e, query.page))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for page: {}",
                response.status(),
                query.page
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for page {}: {}", query.page, e))
    }
}
