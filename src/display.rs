// src/display.rs
use crate::feed::FeedEntry;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuState {
    #[default]
    Hidden,
    Visible,
}

impl MenuState {
    pub fn toggled(self) -> Self {
        match self {
            MenuState::Hidden => MenuState::Visible,
            MenuState::Visible => MenuState::Hidden,
        }
    }
}

impl fmt::Display for MenuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuState::Hidden => write!(f, "hidden"),
            MenuState::Visible => write!(f, "visible"),
        }
    }
}

/// Read side of the display, as seen by the checks.
pub trait DisplayAccess: Send + Sync {
    fn menu_state(&self) -> MenuState;

    /// Same effect as clicking the menu icon.
    fn activate_menu_toggle(&self);

    fn entry_count(&self) -> usize;

    fn rendered_content(&self) -> String;
}

#[derive(Debug, Default)]
struct DisplayState {
    menu: MenuState,
    header_title: String,
    entries: Vec<FeedEntry>,
}

/// In-memory feed reader page: the menu marker, the header title and the feed container.
#[derive(Debug, Default)]
pub struct FeedDisplay {
    state: Mutex<DisplayState>,
}

impl FeedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        // Writers replace whole fields, so a poisoned lock still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the header title and the whole feed container.
    pub fn render_feed(&self, title: &str, entries: Vec<FeedEntry>) {
        let mut state = self.lock();
        state.header_title = title.to_string();
        state.entries = entries;
    }

    pub fn header_title(&self) -> String {
        self.lock().header_title.clone()
    }

    pub fn entries(&self) -> Vec<FeedEntry> {
        self.lock().entries.clone()
    }
}

impl DisplayAccess for FeedDisplay {
    fn menu_state(&self) -> MenuState {
        self.lock().menu
    }

    fn activate_menu_toggle(&self) {
        let mut state = self.lock();
        state.menu = state.menu.toggled();
    }

    fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn rendered_content(&self) -> String {
        render_entries(&self.lock().entries)
    }
}

/// Markup of the feed container, one `entry` article per item.
pub fn render_entries(entries: &[FeedEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "<a class=\"entry-link\" href=\"{}\"><article class=\"entry\"><h2>{}</h2><p>{}</p></article></a>\n",
            escape_html(entry.link().unwrap_or("#")),
            escape_html(entry.title()),
            escape_html(entry.snippet())
        ));
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
