//! CLI binary for parsegen.
//!
//! A thin shim over the library crate that maps CLI flags to `AgentConfig`
//! and prints the run report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use parsegen::{run, AgentConfig, RunOutcome, RunReport};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a parser for the icici sample pair
  parsegen icici

  # Custom data layout and attempt budget
  parsegen icici --data-dir fixtures --attempts 5

  # Different interpreter and a tighter execution limit
  parsegen sbi --interpreter python3.12 --harness-timeout 10

  # Machine-readable run report
  parsegen icici --json > report.json

SAMPLE LAYOUT:
  <data-dir>/<target>/<target>_sample.pdf   the statement to parse
  <data-dir>/<target>/<target>_sample.csv   the output the parser must match

OUTPUTS:
  <parser-dir>/<target>_parser.py           last attempt's code (overwritten)
  <log-dir>/<target>_generation.log         append-only attempt log

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (required)
  PARSEGEN_MODEL          Override model ID
  PARSEGEN_DATA_DIR       Override --data-dir
  PARSEGEN_INTERPRETER    Override --interpreter

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Generate:        parsegen icici
"#;

/// Generate bank-statement PDF parsers with a self-correcting LLM loop.
#[derive(Parser, Debug)]
#[command(
    name = "parsegen",
    version,
    about = "Generate bank-statement PDF parsers with a self-correcting LLM loop",
    long_about = "Given a sample bank-statement PDF and the CSV it should parse into, parsegen \
asks a code-generation model for a parser, executes it in an isolated child process, diffs the \
output against the target CSV, and retries with corrective feedback up to the attempt budget.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Target bank identifier (selects <data-dir>/<target>/…).
    target: String,

    /// Directory holding the per-bank sample pairs.
    #[arg(long, env = "PARSEGEN_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory the generated parser is written to.
    #[arg(long, env = "PARSEGEN_PARSER_DIR", default_value = "custom_parsers")]
    parser_dir: PathBuf,

    /// Directory for the append-only attempt log.
    #[arg(long, env = "PARSEGEN_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Completion model ID.
    #[arg(long, env = "PARSEGEN_MODEL")]
    model: Option<String>,

    /// Attempt budget: maximum generate-and-test cycles.
    #[arg(long, env = "PARSEGEN_ATTEMPTS", default_value_t = 3)]
    attempts: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PARSEGEN_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max completion tokens per attempt.
    #[arg(long, env = "PARSEGEN_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Interpreter command for executing generated parsers.
    #[arg(long, env = "PARSEGEN_INTERPRETER", default_value = "python3")]
    interpreter: String,

    /// Wall-clock limit for one parser execution, in seconds.
    #[arg(long, env = "PARSEGEN_HARNESS_TIMEOUT", default_value_t = 30)]
    harness_timeout: u64,

    /// Per-completion-call HTTP timeout, in seconds.
    #[arg(long, env = "PARSEGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Output the structured run report as JSON instead of text.
    #[arg(long, env = "PARSEGEN_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "PARSEGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PARSEGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PARSEGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // per-attempt summary printed afterwards carries the same information.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = AgentConfig::builder()
        .max_attempts(cli.attempts)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .data_dir(cli.data_dir.clone())
        .parser_dir(cli.parser_dir.clone())
        .log_dir(cli.log_dir.clone())
        .interpreter(cli.interpreter.as_str())
        .harness_timeout_secs(cli.harness_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the loop ─────────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Generating");
        bar.set_message(format!(
            "parser for '{}' (≤ {} attempts)…",
            cli.target, cli.attempts
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let report = run(&cli.target, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let report = report.context("Parser generation failed")?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_report(&report);
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Human-readable run summary: one line per attempt, then the outcome.
fn print_report(report: &RunReport) {
    for attempt in &report.attempts {
        match &attempt.failure {
            None => eprintln!(
                "  {} Attempt {}  {}",
                green("✓"),
                attempt.attempt,
                dim(&format!("{:.1}s", attempt.duration_ms as f64 / 1000.0)),
            ),
            Some(failure) => {
                // First line only; the full text is in the log.
                let first = failure.lines().next().unwrap_or("");
                let msg = if first.len() > 80 {
                    format!("{}\u{2026}", &first[..79])
                } else {
                    first.to_string()
                };
                eprintln!(
                    "  {} Attempt {}  {}  {}",
                    red("✗"),
                    attempt.attempt,
                    red(&msg),
                    dim(&format!("{:.1}s", attempt.duration_ms as f64 / 1000.0)),
                );
            }
        }
    }

    match &report.outcome {
        RunOutcome::Solved {
            attempt_count,
            parser_path,
        } => {
            eprintln!(
                "{} Parser for '{}' passed on attempt {}  →  {}",
                green("✔"),
                report.bank,
                bold(&attempt_count.to_string()),
                bold(&parser_path.display().to_string()),
            );
            eprintln!(
                "   {}  {}ms total ({}ms generation, {}ms execution)",
                dim(&format!("log: {}", report.log_path.display())),
                report.stats.total_duration_ms,
                report.stats.generation_ms,
                report.stats.harness_ms,
            );
        }
        RunOutcome::Exhausted {
            attempt_count,
            last_error,
        } => {
            eprintln!(
                "{} No working parser for '{}' after {} attempts",
                red("✘"),
                report.bank,
                bold(&attempt_count.to_string()),
            );
            eprintln!("   last error: {last_error}");
            eprintln!("   review the log: {}", report.log_path.display());
        }
    }

    // Keep stdout coherent for shells capturing it: the summary goes to
    // stderr above, stdout carries nothing unless --json was asked for.
    io::stdout().flush().ok();
}
