// src/feed_loader.rs
use crate::completion::CompletionSignal;
use crate::display::FeedDisplay;
use crate::entry_factory::EntryFactory;
use crate::errors::LoaderError;
use crate::feed::FeedCatalog;
use crate::feed_download::{FeedFetcher, download_entries};
use log::{error, info};
use std::sync::Arc;

/// Loads the feed at `index` into the display.
///
/// Returns as soon as the load is started. When rendering has finished, `done` (if given) is
/// fired exactly once. A load that fails after starting still fires `done`; callers that need
/// to know the result inspect the display. An `Err` means the load never started and `done`
/// was dropped.
pub trait FeedLoader: Send + Sync {
    fn load_feed(&self, index: usize, done: Option<CompletionSignal>) -> Result<(), LoaderError>;
}

pub struct RenderingFeedLoader {
    catalog: Arc<FeedCatalog>,
    fetcher: Arc<dyn FeedFetcher + Send + Sync>,
    display: Arc<FeedDisplay>,
    factory: Arc<EntryFactory>,
}

impl RenderingFeedLoader {
    pub fn new(
        catalog: Arc<FeedCatalog>,
        fetcher: Arc<dyn FeedFetcher + Send + Sync>,
        display: Arc<FeedDisplay>,
        factory: EntryFactory,
    ) -> Self {
        Self { catalog, fetcher, display, factory: Arc::new(factory) }
    }
}

impl FeedLoader for RenderingFeedLoader {
    fn load_feed(&self, index: usize, done: Option<CompletionSignal>) -> Result<(), LoaderError> {
        let feed = self
            .catalog
            .get(index)
            .ok_or(LoaderError::IndexOutOfRange { index, len: self.catalog.len() })?;
        let url = feed.url().cloned().ok_or(LoaderError::MissingField { index, field: "url" })?;
        let name = feed.name().unwrap_or_default().to_string();

        let fetcher = self.fetcher.clone();
        let display = self.display.clone();
        let factory = self.factory.clone();

        info!("Loader: loading feed {} ('{}') from {}", index, name, url);
        tokio::spawn(async move {
            match download_entries(&url, fetcher.as_ref(), &factory).await {
                Ok(entries) => {
                    info!("Loader: rendering {} entries for '{}'", entries.len(), name);
                    display.render_feed(&name, entries);
                }
                Err(e) => {
                    error!("Loader: feed {} ('{}') failed to load: {}", index, name, e);
                }
            }
            if let Some(done) = done {
                done.fire();
            }
        });
        Ok(())
    }
}
