// src/entry_factory.rs
use crate::feed::FeedEntry;
use chrono::{DateTime, Utc};
use log::warn;
use rss::{Channel, Item};

const DEFAULT_SNIPPET_WIDTH: usize = 80;
const DEFAULT_SNIPPET_CHARS: usize = 280;

pub struct EntryFactory {
    entry_limit: Option<usize>,
    snippet_chars: usize,
}

impl Default for EntryFactory {
    fn default() -> Self {
        Self { entry_limit: None, snippet_chars: DEFAULT_SNIPPET_CHARS }
    }
}

impl EntryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder methods
    pub fn with_entry_limit(mut self, limit: usize) -> Self {
        self.entry_limit = Some(limit);
        self
    }

    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    /// Turns channel items into entries, in feed order. Items without a title are skipped.
    pub fn create_entries(&self, channel: &Channel) -> Vec<FeedEntry> {
        let mut entries: Vec<FeedEntry> =
            channel.items().iter().filter_map(|item| self.create_entry(item)).collect();

        if let Some(limit) = self.entry_limit {
            entries.truncate(limit);
        }
        entries
    }

    fn create_entry(&self, item: &Item) -> Option<FeedEntry> {
        let title = item.title().map(str::trim).filter(|t| !t.is_empty())?.to_string();
        let link = item.link().map(String::from);
        let snippet = truncate_chars(&format_snippet(item.description()), self.snippet_chars);
        let published_date = item
            .pub_date()
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(FeedEntry::new(title, link, snippet, published_date))
    }
}

/// Plain-text snippet of an item description, converting HTML when it looks like markup.
pub fn format_snippet(description: Option<&str>) -> String {
    match description {
        Some(desc_str) if desc_str.contains('<') && desc_str.contains('>') => {
            match html2text::from_read(desc_str.as_bytes(), DEFAULT_SNIPPET_WIDTH) {
                Ok(text_content) => text_content
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<&str>>()
                    .join(" "),
                Err(e) => {
                    warn!("Failed to convert HTML description to text: {}", e);
                    desc_str.to_string()
                }
            }
        }
        Some(desc_str) => desc_str.to_string(),
        None => String::new(),
    }
    .trim()
    .to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}
