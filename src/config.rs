//! Configuration for a parser-generation run.
//!
//! All run behaviour is controlled through [`AgentConfig`], built via its
//! [`AgentConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config between the CLI and tests, and to diff two runs to
//! understand why their outcomes differ.
//!
//! # Design choice: builder over constructor
//! The field count keeps growing (interpreter, timeouts, excerpt sizing) and
//! a long positional constructor breaks on every addition. The builder lets
//! callers set only what they care about and rely on documented defaults.

use crate::error::AgentError;
use crate::provider::CodeGenerator;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one parser-generation run.
///
/// Built via [`AgentConfig::builder()`] or [`AgentConfig::default()`].
///
/// # Example
/// ```rust
/// use parsegen::AgentConfig;
///
/// let config = AgentConfig::builder()
///     .max_attempts(3)
///     .model("gemini-2.5-pro")
///     .interpreter("python3")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AgentConfig {
    /// Attempt budget: maximum generate-and-test cycles per run. Default: 3.
    ///
    /// Each attempt costs one completion call plus one parser execution, and
    /// failures feed the next prompt. Three attempts is the point of
    /// diminishing returns in practice — a model that has missed the schema
    /// twice with explicit feedback rarely recovers on attempt four.
    pub max_attempts: u32,

    /// Completion model identifier. If `None`, uses the provider default
    /// (`gemini-2.5-pro`).
    pub model: Option<String>,

    /// Pre-constructed code generator. Takes precedence over environment
    /// auto-detection. Used by tests to inject scripted generators.
    pub generator: Option<Arc<dyn CodeGenerator>>,

    /// Sampling temperature for the completion. Default: 0.2.
    ///
    /// Low temperature keeps the model close to the literal layout evidence
    /// in the PDF excerpt. Some variance is still useful: a retry at
    /// temperature 0 would often reproduce the exact code that just failed.
    pub temperature: f32,

    /// Maximum tokens the model may generate per attempt. Default: 8192.
    ///
    /// A complete parser with regex handling and column mapping runs to a
    /// few hundred lines; truncating mid-function guarantees a syntax error
    /// and a wasted attempt, so the ceiling is generous.
    pub max_output_tokens: usize,

    /// Per-completion-call HTTP timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Directory holding per-bank sample pairs
    /// (`<data_dir>/<bank>/<bank>_sample.pdf` / `.csv`). Default: `data`.
    pub data_dir: PathBuf,

    /// Directory the generated parser is persisted to, as
    /// `<parser_dir>/<bank>_parser.py`. Overwritten on every attempt.
    /// Default: `custom_parsers`.
    pub parser_dir: PathBuf,

    /// Directory for the append-only attempt log,
    /// `<log_dir>/<bank>_generation.log`. Default: `logs`.
    pub log_dir: PathBuf,

    /// Interpreter command the harness runs generated parsers with.
    /// Default: `python3`.
    pub interpreter: String,

    /// Wall-clock limit for one parser execution in seconds. Default: 30.
    ///
    /// Generated code is untrusted: an accidental `while True:` must kill
    /// the child process, not hang the run. The limit counts as an
    /// execution failure and becomes feedback like any other.
    pub harness_timeout_secs: u64,

    /// Maximum characters of extracted PDF text embedded in the prompt.
    /// Default: 4000.
    ///
    /// The excerpt exists to show the model the line layout, not the whole
    /// statement; past a few thousand characters additional pages repeat
    /// the same structure at real token cost.
    pub pdf_excerpt_chars: usize,

    /// Number of expected CSV rows rendered in the prompt as the format
    /// example. Default: 4.
    pub prompt_sample_rows: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            model: None,
            generator: None,
            temperature: 0.2,
            max_output_tokens: 8192,
            api_timeout_secs: 120,
            data_dir: PathBuf::from("data"),
            parser_dir: PathBuf::from("custom_parsers"),
            log_dir: PathBuf::from("logs"),
            interpreter: "python3".to_string(),
            harness_timeout_secs: 30,
            pdf_excerpt_chars: 4000,
            prompt_sample_rows: 4,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("max_attempts", &self.max_attempts)
            .field("model", &self.model)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn CodeGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("data_dir", &self.data_dir)
            .field("parser_dir", &self.parser_dir)
            .field("log_dir", &self.log_dir)
            .field("interpreter", &self.interpreter)
            .field("harness_timeout_secs", &self.harness_timeout_secs)
            .finish()
    }
}

impl AgentConfig {
    /// Create a new builder for `AgentConfig`.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path the generated parser for `bank` is persisted to.
    pub fn parser_path(&self, bank: &str) -> PathBuf {
        self.parser_dir.join(format!("{bank}_parser.py"))
    }

    /// Path of the append-only attempt log for `bank`.
    pub fn log_path(&self, bank: &str) -> PathBuf {
        self.log_dir.join(format!("{bank}_generation.log"))
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn parser_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.parser_dir = dir.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn interpreter(mut self, cmd: impl Into<String>) -> Self {
        self.config.interpreter = cmd.into();
        self
    }

    pub fn harness_timeout_secs(mut self, secs: u64) -> Self {
        self.config.harness_timeout_secs = secs.max(1);
        self
    }

    pub fn pdf_excerpt_chars(mut self, n: usize) -> Self {
        self.config.pdf_excerpt_chars = n.max(100);
        self
    }

    pub fn prompt_sample_rows(mut self, n: usize) -> Self {
        self.config.prompt_sample_rows = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let c = &self.config;
        if c.max_attempts == 0 {
            return Err(AgentError::InvalidConfig(
                "Attempt budget must be ≥ 1".into(),
            ));
        }
        if c.interpreter.trim().is_empty() {
            return Err(AgentError::InvalidConfig(
                "Interpreter command must not be empty".into(),
            ));
        }
        if c.harness_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "Harness timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = AgentConfig::default();
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.interpreter, "python3");
        assert_eq!(c.pdf_excerpt_chars, 4000);
        assert_eq!(c.prompt_sample_rows, 4);
    }

    #[test]
    fn builder_clamps_attempts_to_one() {
        let c = AgentConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn empty_interpreter_is_rejected() {
        let mut c = AgentConfig::default();
        c.interpreter = "  ".into();
        let err = AgentConfigBuilder { config: c }.build().unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig(_)));
    }

    #[test]
    fn derived_paths_embed_the_bank_name() {
        let c = AgentConfig::default();
        assert_eq!(
            c.parser_path("icici"),
            PathBuf::from("custom_parsers/icici_parser.py")
        );
        assert_eq!(
            c.log_path("icici"),
            PathBuf::from("logs/icici_generation.log")
        );
    }
}
