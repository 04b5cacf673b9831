//! Run report types: what one correction-loop run produced.
//!
//! The report is the caller's only view of the run — per-attempt records,
//! aggregate stats, and a terminal outcome. Everything is `Serialize` so
//! the CLI's `--json` mode can print the whole structure verbatim.

use serde::Serialize;
use std::path::PathBuf;

/// One generate-and-test cycle, as recorded by the loop.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    /// 1-based ordinal of this attempt.
    pub attempt: u32,
    /// The cleaned source this attempt persisted and executed. Empty when
    /// generation itself failed.
    pub source: String,
    /// Failure text when the attempt failed; `None` means the attempt
    /// passed the contract check.
    pub failure: Option<String>,
    /// Wall-clock duration of the whole cycle.
    pub duration_ms: u64,
}

impl AttemptRecord {
    pub fn is_pass(&self) -> bool {
        self.failure.is_none()
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// An attempt passed the contract check.
    Solved {
        /// Number of attempts consumed, including the passing one.
        attempt_count: u32,
        /// Where the working parser was persisted.
        parser_path: PathBuf,
    },
    /// The attempt budget ran out without a passing verdict.
    Exhausted {
        /// Attempts consumed (equals the budget).
        attempt_count: u32,
        /// The final attempt's failure text, verbatim.
        last_error: String,
    },
}

/// Aggregate timing for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// End-to-end duration, sample loading included.
    pub total_duration_ms: u64,
    /// Time spent inside completion calls.
    pub generation_ms: u64,
    /// Time spent persisting and executing generated parsers.
    pub harness_ms: u64,
}

/// The full result of [`crate::agent::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Target bank identifier.
    pub bank: String,
    /// Terminal outcome.
    pub outcome: RunOutcome,
    /// Every attempt, in order.
    pub attempts: Vec<AttemptRecord>,
    /// Aggregate timing.
    pub stats: RunStats,
    /// Path of the append-only attempt log.
    pub log_path: PathBuf,
}

impl RunReport {
    /// Whether the run ended in a working parser.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Solved { .. })
    }

    /// Attempts consumed, regardless of outcome.
    pub fn attempt_count(&self) -> u32 {
        match &self.outcome {
            RunOutcome::Solved { attempt_count, .. }
            | RunOutcome::Exhausted { attempt_count, .. } => *attempt_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved() -> RunReport {
        RunReport {
            bank: "icici".into(),
            outcome: RunOutcome::Solved {
                attempt_count: 2,
                parser_path: PathBuf::from("custom_parsers/icici_parser.py"),
            },
            attempts: vec![],
            stats: RunStats::default(),
            log_path: PathBuf::from("logs/icici_generation.log"),
        }
    }

    #[test]
    fn solved_report_is_success() {
        let r = solved();
        assert!(r.is_success());
        assert_eq!(r.attempt_count(), 2);
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_string(&solved()).unwrap();
        assert!(json.contains(r#""status":"solved""#));
        assert!(json.contains("icici_parser.py"));

        let exhausted = RunOutcome::Exhausted {
            attempt_count: 3,
            last_error: "row count mismatch: expected 2, got 0".into(),
        };
        let json = serde_json::to_string(&exhausted).unwrap();
        assert!(json.contains(r#""status":"exhausted""#));
        assert!(json.contains("row count mismatch"));
    }
}
