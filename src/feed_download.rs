// src/feed_download.rs
use crate::entry_factory::EntryFactory;
use crate::errors::LoaderError;
use crate::feed::{FeedEntry, FeedURL};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use rss::Channel;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

// ===== fetcher
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, LoaderError>;
}

pub fn validate_url_syntax_and_scheme(url_str: &str) -> Result<Url, LoaderError> {
    let parsed_url = Url::parse(url_str)
        .map_err(|parse_err| LoaderError::InvalidUrl(format!("'{}': {}", url_str, parse_err)))?;

    if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
        return Err(LoaderError::InvalidUrl(format!(
            "'{}': scheme '{}' is not supported, only http/https",
            url_str,
            parsed_url.scheme()
        )));
    }
    Ok(parsed_url)
}

// ===== Live http fetcher
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        const APP_USER_AGENT: &str = concat!("feedspec/", env!("CARGO_PKG_VERSION"));

        let client: Client =
            reqwest::Client::builder().user_agent(APP_USER_AGENT).timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoaderError> {
        let url = validate_url_syntax_and_scheme(url)?;
        info!("HttpFeedFetcher: fetching {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(LoaderError::Failed(format!(
                "GET request failed with status: {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

// ===== Fake fetcher for tests and offline runs
#[derive(Debug, Default, Clone)]
pub struct FakeFetcher {
    responses: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl FeedFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoaderError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| LoaderError::Failed(format!("no response stubbed for {}", url)))
    }
}

pub async fn download_entries(
    url: &FeedURL,
    fetcher: &(dyn FeedFetcher + Send + Sync),
    factory: &EntryFactory,
) -> Result<Vec<FeedEntry>, LoaderError> {
    let content: String = fetcher.fetch(url.as_str()).await?;
    debug!("download_entries: {} bytes fetched from {}", content.len(), url);
    let channel: Channel = Channel::read_from(content.as_bytes())?;

    Ok(factory.create_entries(&channel))
}
