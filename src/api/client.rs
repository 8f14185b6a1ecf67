use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use std::time::Duration;

use super::error::ApiError;
use super::models::{RawEvent, RawSearchResponse};
use crate::search::SearchRequest;

/// Thin wrapper over the Discovery API. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: String, api_key: String, timeout_seconds: u64) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .with_context(|| format!("Invalid API URL: {}", base_url))?;
        if parsed.cannot_be_a_base() {
            bail!("Invalid API URL: {}", base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed,
            api_key,
        })
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot fail: checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn event_url(&self, event_id: &str) -> Url {
        self.endpoint(&["events", &format!("{}.json", event_id)])
    }

    pub async fn search_events(&self, request: &SearchRequest) -> Result<RawSearchResponse, ApiError> {
        let url = self.endpoint(&["events.json"]);
        tracing::debug!(page = request.page, keyword = ?request.keyword, city = ?request.city, "searching events");

        let response = self
            .client
            .get(url)
            .query(&request.query_pairs(&self.api_key))
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<RawSearchResponse>().await?;
        Ok(body)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<RawEvent, ApiError> {
        let url = self.event_url(event_id);
        tracing::debug!(event_id, "fetching event detail");

        let response = self
            .client
            .get(url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let event = response.json::<RawEvent>().await?;
        Ok(event)
    }
}
