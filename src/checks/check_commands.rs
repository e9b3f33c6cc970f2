use crate::display::MenuState;
use std::fmt;

/// Something a check asserts about the catalog or the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The catalog exists and holds at least one feed.
    FeedsDefined,
    EveryFeedHasUrl,
    EveryFeedHasName,
    MenuIs(MenuState),
    /// The feed container holds at least one entry.
    HasEntries,
    /// The feed container differs from the snapshot taken earlier in the same check.
    ContentDiffersFromSnapshot,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::FeedsDefined => write!(f, "feeds are defined"),
            Expectation::EveryFeedHasUrl => write!(f, "every feed has a url"),
            Expectation::EveryFeedHasName => write!(f, "every feed has a name"),
            Expectation::MenuIs(state) => write!(f, "menu is {}", state),
            Expectation::HasEntries => write!(f, "feed container has entries"),
            Expectation::ContentDiffersFromSnapshot => write!(f, "content changed"),
        }
    }
}

// One step of a check, including the 'next' step.
#[derive(Debug, Clone)]
pub enum SequenceCmd {
    LoadAndWait(usize, Box<SequenceCmd>), // Suspends until the load signals completion
    LoadDetached(usize, Box<SequenceCmd>),
    CaptureSnapshot(Box<SequenceCmd>),
    ToggleMenu(Box<SequenceCmd>),
    Expect(Expectation, Box<SequenceCmd>),
    End,
}

impl SequenceCmd {
    pub fn load_and_wait(index: usize, next: SequenceCmd) -> Self {
        SequenceCmd::LoadAndWait(index, Box::new(next))
    }

    pub fn load_detached(index: usize, next: SequenceCmd) -> Self {
        SequenceCmd::LoadDetached(index, Box::new(next))
    }

    pub fn capture_snapshot(next: SequenceCmd) -> Self {
        SequenceCmd::CaptureSnapshot(Box::new(next))
    }

    pub fn toggle_menu(next: SequenceCmd) -> Self {
        SequenceCmd::ToggleMenu(Box::new(next))
    }

    pub fn expect(expectation: Expectation, next: SequenceCmd) -> Self {
        SequenceCmd::Expect(expectation, Box::new(next))
    }

    pub fn end() -> Self {
        SequenceCmd::End
    }

    /// Number of steps before `End`.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut node = self;
        loop {
            node = match node {
                SequenceCmd::LoadAndWait(_, next)
                | SequenceCmd::LoadDetached(_, next)
                | SequenceCmd::CaptureSnapshot(next)
                | SequenceCmd::ToggleMenu(next)
                | SequenceCmd::Expect(_, next) => next,
                SequenceCmd::End => return count,
            };
            count += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SequenceCmd::End)
    }
}
