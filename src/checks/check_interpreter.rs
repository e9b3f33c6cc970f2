// src/checks/check_interpreter.rs
use crate::checks::check_algebra::{CheckAlgebra, StepAccumulator};
use crate::checks::check_commands::Expectation;
use crate::completion::{CompletionError, completion_pair};
use crate::display::DisplayAccess;
use crate::errors::CheckFailure;
use crate::feed::{FeedCatalog, FeedDescriptor};
use crate::feed_loader::FeedLoader;
use async_trait::async_trait;
use log::{debug, info, trace};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(5000);

/// Interprets check steps against a feed catalog, a loader and the display it renders into.
///
/// `catalog` is `None` when no catalog could be provided at all; the catalog checks report it.
pub struct DisplayCheckInterpreter {
    catalog: Option<Arc<FeedCatalog>>,
    loader: Arc<dyn FeedLoader>,
    display: Arc<dyn DisplayAccess>,
    load_timeout: Duration,
}

impl DisplayCheckInterpreter {
    pub fn new(
        catalog: Option<Arc<FeedCatalog>>,
        loader: Arc<dyn FeedLoader>,
        display: Arc<dyn DisplayAccess>,
    ) -> Self {
        Self { catalog, loader, display, load_timeout: DEFAULT_LOAD_TIMEOUT }
    }

    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    fn catalog(&self) -> Result<&FeedCatalog, CheckFailure> {
        self.catalog
            .as_deref()
            .ok_or_else(|| CheckFailure::assertion("feed catalog", "to be defined", "undefined"))
    }

    /// Fails on the first feed whose field is missing or empty.
    fn every_feed_has(
        &self,
        field: &str,
        value_of: impl Fn(&FeedDescriptor) -> Option<&str>,
    ) -> Result<(), CheckFailure> {
        for (index, feed) in self.catalog()?.feeds().iter().enumerate() {
            let subject = format!("feed {} {}", index, field);
            match value_of(feed) {
                None => return Err(CheckFailure::assertion(subject, "to be defined", "undefined")),
                Some("") => return Err(CheckFailure::assertion(subject, "not to be empty", "empty")),
                Some(_) => trace!("Interpreter: {} ok", subject),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CheckAlgebra for DisplayCheckInterpreter {
    async fn interpret_load_and_wait(
        &mut self,
        index: usize,
        current_acc: StepAccumulator,
    ) -> StepAccumulator {
        let mut ctx = current_acc?;
        let operation = format!("load of feed {}", index);
        debug!("Interpreter: starting {} and waiting up to {:?}", operation, self.load_timeout);

        let (signal, completion) = completion_pair();
        self.loader.load_feed(index, Some(signal))?;

        match completion.wait(self.load_timeout).await {
            Ok(()) => {
                ctx.loads_completed += 1;
                Ok(ctx)
            }
            Err(CompletionError::TimedOut(waited)) => {
                Err(CheckFailure::Timeout { operation, waited })
            }
            Err(CompletionError::Abandoned) => Err(CheckFailure::Abandoned { operation }),
        }
    }

    async fn interpret_load_detached(
        &mut self,
        index: usize,
        current_acc: StepAccumulator,
    ) -> StepAccumulator {
        let ctx = current_acc?;
        info!("Interpreter: starting load of feed {} without waiting", index);
        self.loader.load_feed(index, None)?;
        Ok(ctx)
    }

    async fn interpret_capture_snapshot(
        &mut self,
        current_acc: StepAccumulator,
    ) -> StepAccumulator {
        let mut ctx = current_acc?;
        let content = self.display.rendered_content();
        debug!("Interpreter: captured snapshot of {} bytes", content.len());
        ctx.snapshot = Some(content);
        Ok(ctx)
    }

    async fn interpret_toggle_menu(&mut self, current_acc: StepAccumulator) -> StepAccumulator {
        let ctx = current_acc?;
        self.display.activate_menu_toggle();
        trace!("Interpreter: menu toggled, now {}", self.display.menu_state());
        Ok(ctx)
    }

    async fn interpret_expect(
        &mut self,
        expectation: &Expectation,
        current_acc: StepAccumulator,
    ) -> StepAccumulator {
        let ctx = current_acc?;
        trace!("Interpreter: expecting {}", expectation);

        match expectation {
            Expectation::FeedsDefined => {
                let catalog = self.catalog()?;
                if catalog.is_empty() {
                    return Err(CheckFailure::assertion("feed catalog length", "not to be 0", "0"));
                }
            }
            Expectation::EveryFeedHasUrl => {
                self.every_feed_has("url", |feed| feed.url().map(|u| u.as_str()))?;
            }
            Expectation::EveryFeedHasName => {
                self.every_feed_has("name", FeedDescriptor::name)?;
            }
            Expectation::MenuIs(expected) => {
                let actual = self.display.menu_state();
                if actual != *expected {
                    return Err(CheckFailure::assertion(
                        "menu",
                        format!("to be {}", expected),
                        actual.to_string(),
                    ));
                }
            }
            Expectation::HasEntries => {
                let count = self.display.entry_count();
                if count == 0 {
                    return Err(CheckFailure::assertion(
                        "entry count in feed container",
                        "not to be 0",
                        "0",
                    ));
                }
            }
            Expectation::ContentDiffersFromSnapshot => {
                let Some(snapshot) = ctx.snapshot.as_deref() else {
                    return Err(CheckFailure::Raised(
                        "no snapshot was captured before comparing content".to_string(),
                    ));
                };
                if self.display.rendered_content() == snapshot {
                    return Err(CheckFailure::assertion(
                        "feed container content",
                        "to differ from the snapshot",
                        "unchanged",
                    ));
                }
            }
        }
        Ok(ctx)
    }

    async fn interpret_end(&mut self, final_acc: StepAccumulator) -> StepAccumulator {
        trace!("Interpreter: reached End, ok = {}", final_acc.is_ok());
        final_acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::check_algebra::{CheckContext, run_steps};
    use crate::checks::check_commands::SequenceCmd;
    use crate::checks::report::{CheckOutcome, FailureKind, Phase};
    use crate::checks::suite::{Suite, SuiteRunner};
    use crate::completion::CompletionSignal;
    use crate::display::{FeedDisplay, MenuState};
    use crate::errors::LoaderError;
    use crate::feed::FeedEntry;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Renders `index + 1` canned entries per load and fires immediately.
    struct InstantLoader {
        display: Arc<FeedDisplay>,
        started: Mutex<Vec<usize>>,
    }

    impl FeedLoader for InstantLoader {
        fn load_feed(
            &self,
            index: usize,
            done: Option<CompletionSignal>,
        ) -> Result<(), LoaderError> {
            self.started.lock().unwrap().push(index);
            let entries = (0..=index)
                .map(|i| FeedEntry::new(format!("feed {} entry {}", index, i), None, String::new(), None))
                .collect();
            self.display.render_feed(&format!("feed {}", index), entries);
            if let Some(done) = done {
                done.fire();
            }
            Ok(())
        }
    }

    /// Keeps every signal alive but never fires it.
    #[derive(Default)]
    struct SilentLoader {
        held: Mutex<Vec<CompletionSignal>>,
    }

    impl FeedLoader for SilentLoader {
        fn load_feed(&self, _: usize, done: Option<CompletionSignal>) -> Result<(), LoaderError> {
            self.held.lock().unwrap().extend(done);
            Ok(())
        }
    }

    /// Drops every signal unfired, as a load task that dies before rendering would.
    struct DroppingLoader;

    impl FeedLoader for DroppingLoader {
        fn load_feed(&self, _: usize, done: Option<CompletionSignal>) -> Result<(), LoaderError> {
            drop(done);
            Ok(())
        }
    }

    fn two_feeds() -> Option<Arc<FeedCatalog>> {
        Some(Arc::new(FeedCatalog::new(vec![
            FeedDescriptor::new("http://a", "A"),
            FeedDescriptor::new("http://b", "B"),
        ])))
    }

    fn interpreter(catalog: Option<Arc<FeedCatalog>>) -> (DisplayCheckInterpreter, Arc<InstantLoader>) {
        let display = Arc::new(FeedDisplay::new());
        let loader = Arc::new(InstantLoader { display: display.clone(), started: Mutex::new(vec![]) });
        (DisplayCheckInterpreter::new(catalog, loader.clone(), display), loader)
    }

    async fn expect(interp: &mut DisplayCheckInterpreter, expectation: Expectation) -> StepAccumulator {
        interp.interpret_expect(&expectation, Ok(CheckContext::default())).await
    }

    #[tokio::test]
    async fn test_catalog_expectations_pass_for_complete_catalog() {
        let (mut interp, _) = interpreter(two_feeds());
        assert!(expect(&mut interp, Expectation::FeedsDefined).await.is_ok());
        assert!(expect(&mut interp, Expectation::EveryFeedHasUrl).await.is_ok());
        assert!(expect(&mut interp, Expectation::EveryFeedHasName).await.is_ok());
    }

    #[tokio::test]
    async fn test_switching_feeds_changes_content() {
        let (mut interp, loader) = interpreter(two_feeds());
        let cmd = SequenceCmd::load_and_wait(
            0,
            SequenceCmd::capture_snapshot(SequenceCmd::load_and_wait(
                1,
                SequenceCmd::expect(Expectation::ContentDiffersFromSnapshot, SequenceCmd::end()),
            )),
        );

        let ctx = run_steps(&cmd, Ok(CheckContext::default()), &mut interp).await.unwrap();

        assert_eq!(ctx.loads_completed, 2);
        assert!(ctx.snapshot.unwrap().contains("feed 0 entry 0"));
        assert_eq!(*loader.started.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_menu_toggle_round_trip() {
        let (mut interp, _) = interpreter(two_feeds());
        let cmd = SequenceCmd::toggle_menu(SequenceCmd::expect(
            Expectation::MenuIs(MenuState::Visible),
            SequenceCmd::toggle_menu(SequenceCmd::expect(
                Expectation::MenuIs(MenuState::Hidden),
                SequenceCmd::end(),
            )),
        ));
        assert!(run_steps(&cmd, Ok(CheckContext::default()), &mut interp).await.is_ok());
    }

    // SAD PATHS

    #[tokio::test]
    async fn test_empty_catalog_fails_with_assertion() {
        let (mut interp, _) = interpreter(Some(Arc::new(FeedCatalog::default())));
        let result = expect(&mut interp, Expectation::FeedsDefined).await;
        assert_eq!(
            result,
            Err(CheckFailure::assertion("feed catalog length", "not to be 0", "0"))
        );
    }

    #[tokio::test]
    async fn test_undefined_catalog_fails_every_catalog_check() {
        let (mut interp, _) = interpreter(None);
        for expectation in
            [Expectation::FeedsDefined, Expectation::EveryFeedHasUrl, Expectation::EveryFeedHasName]
        {
            let result = expect(&mut interp, expectation).await;
            assert!(matches!(result, Err(CheckFailure::Assertion { subject, .. }) if subject == "feed catalog"));
        }
    }

    #[tokio::test]
    async fn test_field_check_reports_first_offending_feed() {
        let catalog = FeedCatalog::new(vec![
            FeedDescriptor::new("http://a", "A"),
            FeedDescriptor::new("http://b", ""),
            FeedDescriptor::from_parts(None, None),
        ]);
        let (mut interp, _) = interpreter(Some(Arc::new(catalog)));

        let name = expect(&mut interp, Expectation::EveryFeedHasName).await;
        assert_eq!(name, Err(CheckFailure::assertion("feed 1 name", "not to be empty", "empty")));

        let url = expect(&mut interp, Expectation::EveryFeedHasUrl).await;
        assert_eq!(url, Err(CheckFailure::assertion("feed 2 url", "to be defined", "undefined")));
    }

    #[tokio::test]
    async fn test_has_entries_fails_on_empty_container() {
        let (mut interp, _) = interpreter(two_feeds());
        let result = expect(&mut interp, Expectation::HasEntries).await;
        assert!(matches!(result, Err(CheckFailure::Assertion { .. })));
    }

    #[tokio::test]
    async fn test_reloading_same_feed_leaves_content_unchanged() {
        let (mut interp, _) = interpreter(two_feeds());
        let cmd = SequenceCmd::load_and_wait(
            0,
            SequenceCmd::capture_snapshot(SequenceCmd::load_and_wait(
                0,
                SequenceCmd::expect(Expectation::ContentDiffersFromSnapshot, SequenceCmd::end()),
            )),
        );
        let result = run_steps(&cmd, Ok(CheckContext::default()), &mut interp).await;
        assert!(matches!(result, Err(CheckFailure::Assertion { actual, .. }) if actual == "unchanged"));
    }

    #[tokio::test]
    async fn test_silent_loader_times_out() {
        let display = Arc::new(FeedDisplay::new());
        let mut interp =
            DisplayCheckInterpreter::new(two_feeds(), Arc::new(SilentLoader::default()), display)
                .with_load_timeout(Duration::from_millis(20));

        let result = interp.interpret_load_and_wait(0, Ok(CheckContext::default())).await;

        assert_eq!(
            result,
            Err(CheckFailure::Timeout {
                operation: "load of feed 0".to_string(),
                waited: Duration::from_millis(20),
            })
        );
    }

    #[tokio::test]
    async fn test_dropped_signal_fails_without_waiting_out_the_limit() {
        let display = Arc::new(FeedDisplay::new());
        let mut interp = DisplayCheckInterpreter::new(two_feeds(), Arc::new(DroppingLoader), display)
            .with_load_timeout(Duration::from_secs(5));

        let started = Instant::now();
        let result = interp.interpret_load_and_wait(0, Ok(CheckContext::default())).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(result, Err(CheckFailure::Abandoned { operation: "load of feed 0".to_string() }));
    }

    #[tokio::test]
    async fn test_dropped_signal_is_reported_as_setup_timeout() {
        let display = Arc::new(FeedDisplay::new());
        let interp = DisplayCheckInterpreter::new(two_feeds(), Arc::new(DroppingLoader), display)
            .with_load_timeout(Duration::from_secs(5));
        let suite = Suite::new("Initial entries")
            .before_each(SequenceCmd::load_and_wait(0, SequenceCmd::end()))
            .check(
                "has at least a single entry",
                SequenceCmd::expect(Expectation::HasEntries, SequenceCmd::end()),
            );

        let started = Instant::now();
        let report = SuiteRunner::new(interp).run(&[suite]).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(
            &report.results[0].outcome,
            CheckOutcome::Failed { phase: Phase::Setup, kind: FailureKind::Timeout, .. }
        ));
    }
}
