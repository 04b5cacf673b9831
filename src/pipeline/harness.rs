//! Parser harness: persist generated source and execute it in isolation.
//!
//! ## Why a child process?
//!
//! The source under test was written by a model seconds ago — it can raise,
//! hang, or be syntactically invalid. Running it inside a separate
//! interpreter process means the worst it can do is fail its own attempt:
//! a crash becomes captured stderr, an infinite loop is killed at the
//! wall-clock limit, and the host process never sees either.
//!
//! ## The result channel
//!
//! The harness drives an embedded driver script that imports the persisted
//! parser by path, calls `parse_pdf(pdf_path)`, and prints the table as
//! `{"columns": [...], "rows": [[...]]}` JSON on stdout. Emitting columns
//! as an explicit list (rather than relying on object key order surviving
//! serialisation) is what lets the contract checker treat column *order*
//! as significant.

use crate::error::AttemptError;
use crate::table::Table;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Driver executed as `<interpreter> driver.py <parser_path> <pdf_path>`.
///
/// Structural failures (wrong return type, empty result) exit non-zero with
/// a one-line reason; exceptions from the generated code propagate as a
/// traceback. Either way stderr is the attempt's failure text.
const DRIVER_SOURCE: &str = r#"import importlib.util
import json
import sys

spec = importlib.util.spec_from_file_location("generated_parser", sys.argv[1])
module = importlib.util.module_from_spec(spec)
spec.loader.exec_module(module)

rows = module.parse_pdf(sys.argv[2])

if not isinstance(rows, list) or not all(isinstance(r, dict) for r in rows):
    print("ERROR: parse_pdf must return a list of dicts.", file=sys.stderr)
    sys.exit(1)
if not rows:
    print("ERROR: parse_pdf returned an empty list; no transactions were found.", file=sys.stderr)
    sys.exit(1)

columns = list(rows[0].keys())
out = {"columns": columns, "rows": [[r.get(c, "") for c in columns] for r in rows]}
json.dump(out, sys.stdout)
"#;

/// The compile-and-invoke capability: source text in, table or error out.
///
/// The loop owns the parser path and passes it in; implementations must
/// persist the source there (overwriting any prior attempt) before
/// executing, so the file always holds the last attempt's code.
#[async_trait]
pub trait ParserHarness: Send + Sync {
    async fn run(
        &self,
        source: &str,
        pdf_path: &Path,
        parser_path: &Path,
    ) -> Result<Table, AttemptError>;
}

/// Production harness: executes generated parsers with a Python interpreter.
pub struct PythonHarness {
    interpreter: String,
    timeout: Duration,
}

impl PythonHarness {
    pub fn new(interpreter: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn from_config(config: &crate::config::AgentConfig) -> Self {
        Self::new(&config.interpreter, config.harness_timeout_secs)
    }
}

#[async_trait]
impl ParserHarness for PythonHarness {
    async fn run(
        &self,
        source: &str,
        pdf_path: &Path,
        parser_path: &Path,
    ) -> Result<Table, AttemptError> {
        persist_source(source, parser_path).await?;

        // The driver goes on disk too: argv stays free of quoting concerns
        // and tracebacks get a real file name.
        let driver_dir = tempfile::tempdir().map_err(|e| AttemptError::Execution {
            detail: format!("failed to create driver directory: {e}"),
        })?;
        let driver_path = driver_dir.path().join("driver.py");
        tokio::fs::write(&driver_path, DRIVER_SOURCE)
            .await
            .map_err(|e| AttemptError::Execution {
                detail: format!("failed to write driver script: {e}"),
            })?;

        debug!(
            "Executing {} against {}",
            parser_path.display(),
            pdf_path.display()
        );

        let child = Command::new(&self.interpreter)
            .arg(&driver_path)
            .arg(parser_path)
            .arg(pdf_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AttemptError::Execution {
                    detail: format!("failed to launch '{}': {e}", self.interpreter),
                })
            }
            Err(_) => {
                return Err(AttemptError::Execution {
                    detail: format!(
                        "parser execution timed out after {}s",
                        self.timeout.as_secs()
                    ),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let mut detail = String::new();
            if !stderr.trim().is_empty() {
                detail.push_str(stderr.trim());
            }
            if !stdout.trim().is_empty() {
                if !detail.is_empty() {
                    detail.push('\n');
                }
                detail.push_str(stdout.trim());
            }
            if detail.is_empty() {
                detail = format!("parser exited with {}", output.status);
            }
            return Err(AttemptError::Execution { detail });
        }

        parse_harness_output(&stdout)
    }
}

/// Write the generated source to the parser path, creating parent dirs.
async fn persist_source(source: &str, parser_path: &Path) -> Result<(), AttemptError> {
    if let Some(parent) = parser_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AttemptError::Execution {
                detail: format!("failed to create parser directory '{}': {e}", parent.display()),
            })?;
    }
    tokio::fs::write(parser_path, source)
        .await
        .map_err(|e| AttemptError::Execution {
            detail: format!("failed to persist parser to '{}': {e}", parser_path.display()),
        })
}

#[derive(Debug, Deserialize)]
struct HarnessOutput {
    columns: Vec<String>,
    rows: Vec<Vec<serde_json::Value>>,
}

/// Parse the driver's stdout JSON into a [`Table`].
fn parse_harness_output(stdout: &str) -> Result<Table, AttemptError> {
    let parsed: HarnessOutput =
        serde_json::from_str(stdout.trim()).map_err(|e| AttemptError::Execution {
            detail: format!("parser printed malformed output ({e}): {}", stdout.trim()),
        })?;

    let rows = parsed
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect();

    Ok(Table::new(parsed.columns, rows))
}

/// Render one JSON cell the way the target CSV renders it.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_output_preserves_column_order() {
        let out = r#"{"columns": ["Date", "Description", "Balance"],
                      "rows": [["01-01-2025", "COFFEE", 4880.0], ["02-01-2025", "SALARY", null]]}"#;
        let table = parse_harness_output(out).unwrap();
        assert_eq!(table.columns, vec!["Date", "Description", "Balance"]);
        assert_eq!(table.rows[0][2], "4880.0");
        assert_eq!(table.rows[1][2], "");
    }

    #[test]
    fn malformed_output_is_an_execution_error() {
        let err = parse_harness_output("not json at all").unwrap_err();
        match err {
            AttemptError::Execution { detail } => {
                assert!(detail.contains("malformed output"));
                assert!(detail.contains("not json at all"));
            }
            other => panic!("expected Execution, got {other:?}"),
        }
    }

    #[test]
    fn driver_emits_the_result_channel_contract() {
        assert!(DRIVER_SOURCE.contains("parse_pdf(sys.argv[2])"));
        assert!(DRIVER_SOURCE.contains(r#""columns": columns"#));
        assert!(DRIVER_SOURCE.contains("json.dump"));
    }

    #[tokio::test]
    async fn persist_overwrites_prior_attempt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("parsers").join("icici_parser.py");
        persist_source("first", &path).await.unwrap();
        persist_source("second", &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
