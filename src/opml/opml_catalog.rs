use crate::feed::{FeedCatalog, FeedDescriptor, FeedURL};
use log::debug;
use opml::{OPML, Outline};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpmlParseError {
    #[error("Failed to read OPML file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse OPML data: {0}")]
    OpmlFormatError(#[from] opml::Error),

    #[error("Outline '{0}' is marked as a feed but has no 'xmlUrl' attribute")]
    MissingXmlUrl(String),
}

/// Builds a feed catalog from an OPML subscription list.
///
/// Feeds are outlines with `type="rss"` or an `xmlUrl` attribute, collected in document
/// order, descending into folders. The feed name is taken from `title`, falling back to
/// `text`. A name may come out empty; the catalog checks are the place that reports it.
///
/// ```xml
/// <opml version="2.0">
///     <body>
///         <outline text="Web">
///             <outline type="rss" text="CSS Tricks" xmlUrl="http://feeds.feedburner.com/CssTricks"/>
///         </outline>
///     </body>
/// </opml>
/// ```
pub fn catalog_from_opml_str(opml_content: &str) -> Result<FeedCatalog, OpmlParseError> {
    let document = OPML::from_str(opml_content)?;
    let mut feeds = Vec::new();

    for outline in document.body.outlines {
        collect_feeds(outline, &mut feeds)?;
    }
    debug!("OPML import: {} feeds found", feeds.len());
    Ok(FeedCatalog::new(feeds))
}

pub fn catalog_from_opml_file<P: AsRef<Path>>(
    file_path: P,
) -> Result<FeedCatalog, OpmlParseError> {
    let opml_content = fs::read_to_string(file_path)?;
    catalog_from_opml_str(&opml_content)
}

fn collect_feeds(
    outline: Outline,
    feeds: &mut Vec<FeedDescriptor>,
) -> Result<(), OpmlParseError> {
    let is_feed = outline.r#type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("rss"))
        || outline.xml_url.is_some();

    if is_feed {
        let name = match outline.title.filter(|t| !t.is_empty()) {
            Some(title) => title,
            None => outline.text.clone(),
        };
        let xml_url = outline
            .xml_url
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OpmlParseError::MissingXmlUrl(name.clone()))?;

        feeds.push(FeedDescriptor::from_parts(Some(FeedURL::new(&xml_url)), Some(name)));
    }

    for child in outline.outlines {
        collect_feeds(child, feeds)?;
    }

    Ok(())
}
