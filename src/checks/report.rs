use crate::errors::CheckFailure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DESCRIPTION_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Body,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Body => write!(f, "body"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Assertion,
    Timeout,
    Error,
    Panic,
}

impl From<&CheckFailure> for FailureKind {
    fn from(failure: &CheckFailure) -> Self {
        match failure {
            CheckFailure::Assertion { .. } => FailureKind::Assertion,
            CheckFailure::Timeout { .. } | CheckFailure::Abandoned { .. } => FailureKind::Timeout,
            CheckFailure::Raised(_) => FailureKind::Error,
            CheckFailure::Panicked(_) => FailureKind::Panic,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "assertion"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Error => write!(f, "error"),
            FailureKind::Panic => write!(f, "panic"),
        }
    }
}

/// A failure raised by a phase after the one that decided the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub kind: FailureKind,
    pub message: String,
}

impl PhaseFailure {
    pub fn new(phase: Phase, failure: &CheckFailure) -> Self {
        Self { phase, kind: failure.into(), message: failure.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckOutcome {
    Passed,
    Failed {
        phase: Phase,
        kind: FailureKind,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        later_failures: Vec<PhaseFailure>,
    },
}

impl CheckOutcome {
    pub fn failed(phase: Phase, failure: &CheckFailure) -> Self {
        CheckOutcome::Failed {
            phase,
            kind: failure.into(),
            message: failure.to_string(),
            later_failures: Vec::new(),
        }
    }

    /// Outcome of a check given its phase failures in the order they happened.
    /// The first one decides phase and kind; the rest are kept as `later_failures`.
    pub fn from_failures(failures: &[(Phase, CheckFailure)]) -> Self {
        match failures.split_first() {
            None => CheckOutcome::Passed,
            Some(((phase, first), rest)) => CheckOutcome::Failed {
                phase: *phase,
                kind: first.into(),
                message: first.to_string(),
                later_failures: rest
                    .iter()
                    .map(|(phase, failure)| PhaseFailure::new(*phase, failure))
                    .collect(),
            },
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub suite: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current_suite: Option<&str> = None;
        for result in &self.results {
            if current_suite != Some(result.suite.as_str()) {
                writeln!(f, "{}", result.suite)?;
                current_suite = Some(&result.suite);
            }
            let description = fit_to_width(&result.description, DESCRIPTION_WIDTH);
            match &result.outcome {
                CheckOutcome::Passed => writeln!(f, "  ✓ {}", description)?,
                CheckOutcome::Failed { phase, kind, message, later_failures } => {
                    writeln!(f, "  ✗ {}", description)?;
                    writeln!(f, "      [{}] {}: {}", phase, kind, message)?;
                    for later in later_failures {
                        writeln!(f, "      [{}] {}: {}", later.phase, later.kind, later.message)?;
                    }
                }
            }
        }
        let elapsed = (self.finished_at - self.started_at).num_milliseconds();
        write!(
            f,
            "{} checks, {} failures (finished in {} ms)",
            self.results.len(),
            self.failed_count(),
            elapsed
        )
    }
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with an ellipsis.
pub fn fit_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(suite: &str, description: &str, outcome: CheckOutcome) -> CheckResult {
        CheckResult { suite: suite.to_string(), description: description.to_string(), outcome, elapsed_ms: 1 }
    }

    fn report() -> RunReport {
        let now = Utc::now();
        RunReport {
            started_at: now,
            finished_at: now,
            results: vec![
                result("RSS Feeds", "are defined", CheckOutcome::Passed),
                result(
                    "RSS Feeds",
                    "has a name defined",
                    CheckOutcome::failed(
                        Phase::Body,
                        &CheckFailure::assertion("feed 1 name", "not to be empty", "empty"),
                    ),
                ),
                result(
                    "Initial entries",
                    "has at least a single entry",
                    CheckOutcome::failed(
                        Phase::Setup,
                        &CheckFailure::Timeout {
                            operation: "load of feed 0".to_string(),
                            waited: Duration::from_secs(5),
                        },
                    ),
                ),
            ],
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_text_report_groups_by_suite() {
        let text = report().to_string();
        assert_eq!(text.matches("RSS Feeds\n").count(), 1);
        assert!(text.contains("  ✓ are defined"));
        assert!(text.contains(
            "      [body] assertion: expected feed 1 name not to be empty, but it was empty"
        ));
        assert!(text.contains("[setup] timeout: load of feed 0 did not complete within 5s"));
        assert!(text.contains("3 checks, 2 failures"));
    }

    #[test]
    fn test_json_report_flattens_outcome() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[0]["status"], "passed");
        assert_eq!(results[2]["status"], "failed");
        assert_eq!(results[2]["phase"], "setup");
        assert_eq!(results[2]["kind"], "timeout");
        assert!(results[2].get("later_failures").is_none());
    }

    #[test]
    fn test_later_failures_are_reported() {
        let outcome = CheckOutcome::from_failures(&[
            (Phase::Setup, CheckFailure::Raised("feed 0 is gone".to_string())),
            (Phase::Teardown, CheckFailure::Raised("feed 0 is still gone".to_string())),
        ]);
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            results: vec![result("New Feed Selection", "switches", outcome)],
        };

        let text = report.to_string();
        assert!(text.contains("      [setup] error: feed 0 is gone"));
        assert!(text.contains("      [teardown] error: feed 0 is still gone"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let later = &json["results"][0]["later_failures"];
        assert_eq!(later[0]["phase"], "teardown");
        assert_eq!(later[0]["kind"], "error");
    }

    #[test]
    fn test_no_failures_is_a_pass() {
        assert!(CheckOutcome::from_failures(&[]).is_passed());
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("short", 10), "short");
        assert_eq!(fit_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(fit_to_width("日本語テキスト", 7), "日本語…");
    }
}
