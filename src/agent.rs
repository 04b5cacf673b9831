//! The correction loop: plan, generate, test, feed back, up to the budget.
//!
//! ## Shape of the loop
//!
//! ```text
//! PLAN ──▶ GENERATE ──▶ TEST ──▶ pass? ──▶ DONE
//!  ▲                              │
//!  └────────── feedback ◀─────────┘  (budget left)
//!                                 └▶ EXHAUSTED  (budget spent)
//! ```
//!
//! Strictly sequential: one attempt is live at a time, and attempt N's
//! prompt embeds attempt N-1's failure text verbatim. Every failure mode an
//! attempt can hit — transport error from the completion service, a crash
//! in the generated parser, a schema mismatch — is folded into feedback;
//! only missing/invalid sample inputs and an unconfigured generator abort
//! the run before the loop starts.
//!
//! ## The attempt log
//!
//! Each attempt appends its code, the feedback that shaped it, and its test
//! outcome to `<log_dir>/<bank>_generation.log`. The log is informational
//! only — the loop never reads it back — so append failures degrade to a
//! warning rather than aborting a run that is otherwise working.

use crate::config::AgentConfig;
use crate::error::{AgentError, AttemptError};
use crate::pipeline::check::{check_table, Verdict};
use crate::pipeline::codegen;
use crate::pipeline::harness::{ParserHarness, PythonHarness};
use crate::pipeline::prompt::build_user_prompt;
use crate::pipeline::sample::{load_sample, Sample};
use crate::provider::{gemini, CodeGenerator, GeminiGenerator};
use crate::report::{AttemptRecord, RunOutcome, RunReport, RunStats};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Generate and validate a parser for `bank` with the production stack
/// (Gemini generator, Python harness).
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(AgentError)` only for fatal preconditions — missing or
/// invalid sample files, no generator configured. An exhausted attempt
/// budget is a *successful return* carrying [`RunOutcome::Exhausted`];
/// callers decide how loudly to fail.
pub async fn run(bank: &str, config: &AgentConfig) -> Result<RunReport, AgentError> {
    // Sample first: a missing CSV must fail before any generator exists,
    // let alone gets called.
    let sample = load_sample(bank, config).await?;
    let generator = resolve_generator(config)?;
    let harness = PythonHarness::from_config(config);
    run_loop(sample, config, &generator, &harness).await
}

/// Like [`run`], but with caller-supplied generator and harness.
///
/// The seam the end-to-end tests drive: scripted generators and harnesses
/// exercise every loop transition without a network or an interpreter.
pub async fn run_with(
    bank: &str,
    config: &AgentConfig,
    generator: &Arc<dyn CodeGenerator>,
    harness: &dyn ParserHarness,
) -> Result<RunReport, AgentError> {
    let sample = load_sample(bank, config).await?;
    run_loop(sample, config, generator, harness).await
}

/// Resolve the code generator, from most-specific to least-specific:
/// a pre-built generator in the config, else Gemini from the environment.
fn resolve_generator(config: &AgentConfig) -> Result<Arc<dyn CodeGenerator>, AgentError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let model = config.model.as_deref().unwrap_or(gemini::DEFAULT_MODEL);
    match GeminiGenerator::from_env(
        model,
        config.temperature,
        config.max_output_tokens,
        config.api_timeout_secs,
    ) {
        Some(g) => Ok(Arc::new(g)),
        None => Err(AgentError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: "Set GEMINI_API_KEY, or inject a generator via AgentConfig::builder().generator(...).".to_string(),
        }),
    }
}

/// The state machine proper.
async fn run_loop(
    sample: Sample,
    config: &AgentConfig,
    generator: &Arc<dyn CodeGenerator>,
    harness: &dyn ParserHarness,
) -> Result<RunReport, AgentError> {
    let total_start = Instant::now();
    let bank = sample.bank.clone();
    let parser_path = config.parser_path(&bank);
    let log_path = config.log_path(&bank);

    if let Err(e) = tokio::fs::create_dir_all(&config.log_dir).await {
        warn!("Could not create log dir '{}': {e}", config.log_dir.display());
    }
    let log = AttemptLog::new(log_path.clone());

    let mut attempts: Vec<AttemptRecord> = Vec::new();
    let mut stats = RunStats::default();
    let mut feedback: Option<String> = None;

    info!(
        "Generating parser for '{}' ({} columns, {} target rows, budget {})",
        bank,
        sample.expected.columns.len(),
        sample.expected.row_count(),
        config.max_attempts
    );

    for attempt in 1..=config.max_attempts {
        let attempt_start = Instant::now();
        info!("Attempt {}/{}", attempt, config.max_attempts);

        // ── PLAN ─────────────────────────────────────────────────────────
        let user_prompt = build_user_prompt(&sample, feedback.as_deref(), config);

        // ── GENERATE ─────────────────────────────────────────────────────
        let gen_start = Instant::now();
        let generated = codegen::generate_source(generator, &user_prompt).await;
        stats.generation_ms += gen_start.elapsed().as_millis() as u64;

        let (source, failure) = match generated {
            Ok(source) => {
                // ── TEST ─────────────────────────────────────────────────
                let harness_start = Instant::now();
                let executed = harness.run(&source, &sample.pdf_path, &parser_path).await;
                stats.harness_ms += harness_start.elapsed().as_millis() as u64;

                let verdict = match executed {
                    Ok(table) => match check_table(&table, &sample.expected) {
                        Verdict::Pass => None,
                        Verdict::Fail { detail } => {
                            Some(AttemptError::SchemaMismatch { detail })
                        }
                    },
                    Err(e) => Some(e),
                };
                (source, verdict)
            }
            Err(e) => (String::new(), Some(e)),
        };

        let failure_text = failure.as_ref().map(|e| e.to_string());
        log.append_attempt(attempt, &source, feedback.as_deref(), failure_text.as_deref())
            .await;

        attempts.push(AttemptRecord {
            attempt,
            source,
            failure: failure_text.clone(),
            duration_ms: attempt_start.elapsed().as_millis() as u64,
        });

        match failure_text {
            None => {
                stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
                info!(
                    "Attempt {} passed; parser persisted to {}",
                    attempt,
                    parser_path.display()
                );
                return Ok(RunReport {
                    bank,
                    outcome: RunOutcome::Solved {
                        attempt_count: attempt,
                        parser_path,
                    },
                    attempts,
                    stats,
                    log_path,
                });
            }
            Some(text) => {
                warn!("Attempt {} failed: {text}", attempt);
                feedback = Some(text);
            }
        }
    }

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    let last_error = feedback.unwrap_or_else(|| "no attempt was recorded".to_string());
    warn!(
        "Exhausted {} attempts for '{}'; last error: {last_error}",
        config.max_attempts, bank
    );

    Ok(RunReport {
        bank,
        outcome: RunOutcome::Exhausted {
            attempt_count: config.max_attempts,
            last_error,
        },
        attempts,
        stats,
        log_path,
    })
}

/// Append-only attempt log. Failures to write are warnings, never errors.
struct AttemptLog {
    path: PathBuf,
}

impl AttemptLog {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn append_attempt(
        &self,
        attempt: u32,
        source: &str,
        feedback: Option<&str>,
        failure: Option<&str>,
    ) {
        let mut entry = String::new();
        entry.push_str(&format!("\n--- Attempt {attempt} ---\n"));
        entry.push_str(&format!("Generated Code:\n{source}\n\n"));
        if let Some(feedback) = feedback {
            entry.push_str(&format!("Feedback from Previous Attempt:\n{feedback}\n"));
        }
        match failure {
            None => entry.push_str("Test Output:\nPASS\n"),
            Some(failure) => entry.push_str(&format!("Test Output:\n{failure}\n")),
        }
        entry.push_str(&"=".repeat(80));
        entry.push('\n');

        if let Err(e) = self.append(&entry).await {
            warn!("Could not append to log '{}': {e}", self.path.display());
        }
    }

    async fn append(&self, entry: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

