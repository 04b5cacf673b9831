//! Generation stage: drive the completion call and clean its output.
//!
//! This stage is intentionally thin — all prompt content lives in
//! [`crate::prompts`] and [`crate::pipeline::prompt`], so it can change
//! without touching the error mapping here.
//!
//! ## No inner retry
//!
//! A transport or API failure from the completion service is *not* retried
//! here. The correction loop's attempt budget is the only retry mechanism
//! in the system: a failed call consumes an attempt and its error text
//! becomes the next prompt's feedback, exactly like a schema mismatch.
//!
//! ## Why clean the completion?
//!
//! Even firmly prompted models occasionally wrap code in markdown fences
//! despite "output only raw code". Two cheap deterministic rules fix that
//! without touching content, in the same spirit as a post-processing pass:
//! strip an outer ` ```python … ``` ` wrapper, then drop any stray fence
//! lines that survive.

use crate::error::AttemptError;
use crate::prompts::SYSTEM_PROMPT;
use crate::provider::CodeGenerator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Request one parser source from the generator and clean it for execution.
pub async fn generate_source(
    generator: &Arc<dyn CodeGenerator>,
    user_prompt: &str,
) -> Result<String, AttemptError> {
    let raw = generator
        .generate(SYSTEM_PROMPT, user_prompt)
        .await
        .map_err(|e| AttemptError::Generation {
            detail: e.to_string(),
        })?;

    let source = clean_source(&raw);
    if source.is_empty() {
        return Err(AttemptError::Generation {
            detail: "the model returned no usable source text".into(),
        });
    }

    debug!(
        "Generated {} bytes of parser source via '{}'",
        source.len(),
        generator.name()
    );
    Ok(source)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:python)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Strip markdown fences from a completion and trim it.
pub fn clean_source(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    };

    // Stray fence lines mid-text (a model switching in and out of "code
    // mode") are never valid parser source.
    unfenced
        .lines()
        .filter(|line| {
            let l = line.trim();
            l != "```" && l != "```python"
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_source_passes_through() {
        let src = "import pdfplumber\n\ndef parse_pdf(pdf_path):\n    return []";
        assert_eq!(clean_source(src), src);
    }

    #[test]
    fn outer_python_fence_is_stripped() {
        let raw = "```python\ndef parse_pdf(pdf_path):\n    return []\n```";
        assert_eq!(clean_source(raw), "def parse_pdf(pdf_path):\n    return []");
    }

    #[test]
    fn bare_fence_is_stripped() {
        let raw = "```\nx = 1\n```\n";
        assert_eq!(clean_source(raw), "x = 1");
    }

    #[test]
    fn stray_mid_text_fences_are_dropped() {
        let raw = "def parse_pdf(p):\n```\n    return []";
        assert_eq!(clean_source(raw), "def parse_pdf(p):\n    return []");
    }

    #[test]
    fn whitespace_only_cleans_to_empty() {
        assert_eq!(clean_source("```python\n\n```"), "");
        assert_eq!(clean_source("   \n  "), "");
    }
}
