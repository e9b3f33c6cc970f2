// src/checks/suite.rs
use crate::checks::check_algebra::{CheckAlgebra, CheckContext, StepAccumulator, run_steps};
use crate::checks::check_commands::{Expectation, SequenceCmd};
use crate::checks::report::{CheckOutcome, CheckResult, Phase, RunReport};
use crate::display::MenuState;
use crate::errors::CheckFailure;
use crate::event::RunEvent;
use chrono::Utc;
use futures::FutureExt;
use log::{debug, error, info};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub description: String,
    pub body: SequenceCmd,
}

/// A named group of checks sharing before-each and after-each hooks.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub before_each: Option<SequenceCmd>,
    pub after_each: Option<SequenceCmd>,
    pub checks: Vec<CheckSpec>,
}

impl Suite {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), before_each: None, after_each: None, checks: Vec::new() }
    }

    pub fn before_each(mut self, setup: SequenceCmd) -> Self {
        self.before_each = Some(setup);
        self
    }

    pub fn after_each(mut self, teardown: SequenceCmd) -> Self {
        self.after_each = Some(teardown);
        self
    }

    pub fn check(mut self, description: &str, body: SequenceCmd) -> Self {
        self.checks.push(CheckSpec { description: description.to_string(), body });
        self
    }

    /// Keeps only the checks whose full name ("suite description") contains `pattern`.
    pub fn filtered(mut self, pattern: &str) -> Self {
        let suite_name = self.name.clone();
        self.checks
            .retain(|check| format!("{} {}", suite_name, check.description).contains(pattern));
        self
    }
}

/// The feed reader battery: catalog, menu, initial entries, feed switching.
pub fn standard_suites() -> Vec<Suite> {
    vec![
        Suite::new("RSS Feeds")
            .check("are defined", SequenceCmd::expect(Expectation::FeedsDefined, SequenceCmd::end()))
            .check(
                "has a URL defined",
                SequenceCmd::expect(Expectation::EveryFeedHasUrl, SequenceCmd::end()),
            )
            .check(
                "has a name defined",
                SequenceCmd::expect(Expectation::EveryFeedHasName, SequenceCmd::end()),
            ),
        Suite::new("The menu")
            .check(
                "is hidden by default",
                SequenceCmd::expect(Expectation::MenuIs(MenuState::Hidden), SequenceCmd::end()),
            )
            .check(
                "should change visibility when the menu icon is clicked",
                SequenceCmd::toggle_menu(SequenceCmd::expect(
                    Expectation::MenuIs(MenuState::Visible),
                    SequenceCmd::toggle_menu(SequenceCmd::expect(
                        Expectation::MenuIs(MenuState::Hidden),
                        SequenceCmd::end(),
                    )),
                )),
            ),
        Suite::new("Initial entries")
            .before_each(SequenceCmd::load_and_wait(0, SequenceCmd::end()))
            .check(
                "has at least a single entry",
                SequenceCmd::expect(Expectation::HasEntries, SequenceCmd::end()),
            ),
        Suite::new("New Feed Selection")
            .before_each(SequenceCmd::load_and_wait(
                0,
                SequenceCmd::capture_snapshot(SequenceCmd::load_and_wait(1, SequenceCmd::end())),
            ))
            .after_each(SequenceCmd::load_detached(0, SequenceCmd::end()))
            .check(
                "should change the content when a new feed is loaded",
                SequenceCmd::expect(Expectation::ContentDiffersFromSnapshot, SequenceCmd::end()),
            ),
    ]
}

/// Runs suites one check at a time, in declaration order.
pub struct SuiteRunner<A: CheckAlgebra> {
    algebra: A,
    event_tx: Option<broadcast::Sender<RunEvent>>,
}

impl<A: CheckAlgebra> SuiteRunner<A> {
    pub fn new(algebra: A) -> Self {
        Self { algebra, event_tx: None }
    }

    pub fn with_events(mut self, event_tx: broadcast::Sender<RunEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn algebra(&self) -> &A {
        &self.algebra
    }

    pub async fn run(&mut self, suites: &[Suite]) -> RunReport {
        let started_at = Utc::now();
        let mut results = Vec::new();

        for suite in suites {
            info!("Runner: suite '{}' ({} checks)", suite.name, suite.checks.len());
            for check in &suite.checks {
                results.push(self.run_check(suite, check).await);
            }
        }

        RunReport { started_at, finished_at: Utc::now(), results }
    }

    async fn run_check(&mut self, suite: &Suite, check: &CheckSpec) -> CheckResult {
        self.emit(RunEvent::CheckStarted {
            suite: suite.name.clone(),
            description: check.description.clone(),
            timestamp: Utc::now(),
        });
        let start = Instant::now();
        let mut failures: Vec<(Phase, CheckFailure)> = Vec::new();
        let mut ctx = CheckContext::default();

        if let Some(setup) = &suite.before_each {
            debug!("Runner: setup for '{}' ({} steps)", check.description, setup.len());
            match self.run_phase(setup, Ok(ctx.clone())).await {
                Ok(next) => ctx = next,
                Err(failure) => failures.push((Phase::Setup, failure)),
            }
        }

        if failures.is_empty() {
            match self.run_phase(&check.body, Ok(ctx.clone())).await {
                Ok(next) => ctx = next,
                Err(failure) => failures.push((Phase::Body, failure)),
            }
        }

        // Teardown runs whatever happened before it.
        if let Some(teardown) = &suite.after_each {
            debug!("Runner: teardown for '{}' ({} steps)", check.description, teardown.len());
            match self.run_phase(teardown, Ok(ctx.clone())).await {
                Ok(next) => ctx = next,
                Err(failure) => failures.push((Phase::Teardown, failure)),
            }
        }
        debug!("Runner: '{}' completed {} loads", check.description, ctx.loads_completed);

        for (phase, failure) in &failures {
            error!("Runner: '{} {}' failed in {}: {}", suite.name, check.description, phase, failure);
        }
        let outcome = CheckOutcome::from_failures(&failures);
        let result = CheckResult {
            suite: suite.name.clone(),
            description: check.description.clone(),
            outcome,
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        self.emit(RunEvent::CheckFinished { result: result.clone(), timestamp: Utc::now() });
        result
    }

    /// Runs one phase, turning a panic inside it into a failure of the current check.
    async fn run_phase(&mut self, cmd: &SequenceCmd, acc: StepAccumulator) -> StepAccumulator {
        match AssertUnwindSafe(run_steps(cmd, acc, &mut self.algebra)).catch_unwind().await {
            Ok(acc) => acc,
            Err(payload) => Err(CheckFailure::Panicked(panic_message(payload.as_ref()))),
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.event_tx {
            // No subscriber is fine: progress output is optional.
            let _ = tx.send(event);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
