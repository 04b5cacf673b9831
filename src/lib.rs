//! # parsegen
//!
//! A self-correcting LLM agent that writes bank-statement PDF parsers.
//!
//! ## Why this crate?
//!
//! Every bank lays out its statements differently, and hand-writing a
//! parser per bank does not scale. Given one sample statement PDF and the
//! CSV it should parse into, this crate asks a code-generation model for a
//! parser, executes the result in an isolated child process, diffs its
//! output against the target CSV, and — on a mismatch — retries with the
//! failure text as corrective feedback, up to a fixed attempt budget.
//!
//! ## Pipeline Overview
//!
//! ```text
//! target bank
//!  │
//!  ├─ 1. Sample   load <data>/<bank>/<bank>_sample.{pdf,csv}
//!  ├─ 2. Plan     build the prompt (prior failure embedded on retries)
//!  ├─ 3. Generate completion call → parser source (fences stripped)
//!  ├─ 4. Test     persist + execute in a child process → table or error
//!  ├─ 5. Check    diff against the target CSV → verdict
//!  └─ 6. Loop     pass → done; fail → feedback, next attempt (≤ 3)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parsegen::{run, AgentConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Generator auto-detected from GEMINI_API_KEY
//!     let config = AgentConfig::default();
//!     let report = run("icici", &config).await?;
//!     if report.is_success() {
//!         println!("solved in {} attempt(s)", report.attempt_count());
//!     } else {
//!         eprintln!("exhausted: see {}", report.log_path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `parsegen` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! parsegen = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod agent;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use agent::{run, run_with};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{AgentError, AttemptError};
pub use pipeline::check::{check_table, Verdict};
pub use pipeline::harness::{ParserHarness, PythonHarness};
pub use pipeline::sample::{load_sample, Sample};
pub use provider::{CodeGenerator, GeminiGenerator, ProviderError};
pub use report::{AttemptRecord, RunOutcome, RunReport, RunStats};
pub use table::{ColumnType, Table};
