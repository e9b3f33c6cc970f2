// src/feed.rs
use crate::errors::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// === FEED DESCRIPTOR ===
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedURL(String);

impl std::fmt::Display for FeedURL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for FeedURL {
    fn eq(&self, other: &Self) -> bool {
        // Normalize URLs by trimming trailing slashes
        let a = self.0.trim_end_matches('/');
        let b = other.0.trim_end_matches('/');
        a == b
    }
}

impl Eq for FeedURL {}

impl FeedURL {
    pub fn new(s: &str) -> Self {
        FeedURL(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for FeedURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One subscribable source. Both fields may be absent on the wire; the catalog checks report that.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedDescriptor {
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    url: Option<FeedURL>,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl FeedDescriptor {
    pub fn new(url: &str, name: &str) -> Self {
        Self { url: Some(FeedURL::new(url)), name: Some(name.to_string()) }
    }

    pub fn from_parts(url: Option<FeedURL>, name: Option<String>) -> Self {
        Self { url, name }
    }

    pub fn url(&self) -> Option<&FeedURL> {
        self.url.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for FeedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}>",
            self.name().unwrap_or("(unnamed)"),
            self.url().map(FeedURL::as_str).unwrap_or("no url")
        )
    }
}

// === FEED CATALOG ===

/// Ordered, read-only list of feeds. Feeds are addressed by their position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedCatalog {
    feeds: Vec<FeedDescriptor>,
}

impl FeedCatalog {
    pub fn new(feeds: Vec<FeedDescriptor>) -> Self {
        Self { feeds }
    }

    /// The reader's default subscriptions.
    pub fn builtin() -> Self {
        Self::new(vec![
            FeedDescriptor::new("http://blog.udacity.com/feed", "Udacity Blog"),
            FeedDescriptor::new("http://feeds.feedburner.com/CssTricks", "CSS Tricks"),
            FeedDescriptor::new("http://feeds.feedburner.com/html5rocks", "HTML5 Rocks"),
            FeedDescriptor::new(
                "http://feeds.feedburner.com/udacity-linear-digressions",
                "Linear Digressions",
            ),
        ])
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn feeds(&self) -> &[FeedDescriptor] {
        &self.feeds
    }

    pub fn get(&self, index: usize) -> Option<&FeedDescriptor> {
        self.feeds.get(index)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

// === FEED ENTRY ===
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "title")]
    title: String,
    #[serde(rename = "link")]
    link: Option<String>,
    #[serde(rename = "snippet")]
    snippet: String,
    #[serde(rename = "published_date")]
    published_date: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(
        title: String,
        link: Option<String>,
        snippet: String,
        published_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self { title, link, snippet, published_date }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        self.published_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {"url": "http://a", "name": "A"},
            {"url": "http://b", "name": "B"}
        ]"#;
        let catalog = FeedCatalog::from_json_str(json).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name(), Some("A"));
        assert_eq!(catalog.get(1).unwrap().url(), Some(&FeedURL::new("http://b/")));
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_missing_fields_are_kept_not_rejected() {
        let json = r#"[{"url": "http://a"}, {"name": "No url"}]"#;
        let catalog = FeedCatalog::from_json_str(json).unwrap();

        assert_eq!(catalog.get(0).unwrap().name(), None);
        assert!(catalog.get(1).unwrap().url().is_none());
    }

    #[test]
    fn test_builtin_catalog_is_complete() {
        let catalog = FeedCatalog::builtin();
        assert!(!catalog.is_empty());
        for feed in catalog.feeds() {
            assert!(feed.url().is_some_and(|u| !u.is_empty()));
            assert!(feed.name().is_some_and(|n| !n.is_empty()));
        }
    }

    // SAD PATHS

    #[test]
    fn test_catalog_must_be_an_array() {
        let result = FeedCatalog::from_json_str(r#"{"url": "http://a"}"#);
        assert!(matches!(result, Err(CatalogError::JsonError(_))));
    }

    #[test]
    fn test_catalog_file_not_found() {
        let result = FeedCatalog::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(CatalogError::ReadError(_))));
    }
}
