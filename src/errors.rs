// errors.rs
use crate::opml::opml_catalog::OpmlParseError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("RSS parsing error: {0}")]
    RssError(#[from] rss::Error),

    #[error("Feed index {index} is out of range (catalog has {len} feeds)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Feed {index} is missing required field: {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read feed catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse feed catalog JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to import OPML subscriptions: {0}")]
    OpmlError(#[from] OpmlParseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Why a single check failed. Carried through the step accumulator, so it must stay cheap to clone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    #[error("expected {subject} {expected}, but it was {actual}")]
    Assertion { subject: String, expected: String, actual: String },

    #[error("{operation} did not complete within {waited:?}")]
    Timeout { operation: String, waited: Duration },

    #[error("{operation} dropped its completion signal without firing")]
    Abandoned { operation: String },

    #[error("{0}")]
    Raised(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl CheckFailure {
    pub fn assertion(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        CheckFailure::Assertion {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<LoaderError> for CheckFailure {
    fn from(err: LoaderError) -> Self {
        CheckFailure::Raised(err.to_string())
    }
}
