//! Prompt constants for the code-generation requests.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the generated-function contract
//!    or tightening an instruction requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without a live completion service, so prompt regressions are cheap to
//!    catch.
//!
//! The per-attempt user prompt is assembled in [`crate::pipeline::prompt`];
//! only the fixed text lives here.

/// System prompt sent with every completion request.
///
/// Pins the model to the one contract the harness can execute: a single
/// `parse_pdf` function, raw code only, pdfplumber for PDF access.
pub const SYSTEM_PROMPT: &str = r#"You are an expert Python developer specialising in data extraction from PDFs.
Your task is to write a Python parser for a bank statement PDF that reproduces a specific, sometimes unusual, CSV format.
You must output only the raw Python code for the parser file.
Do not include explanations, markdown formatting, or any text other than the code itself.
The code must contain a function with the exact signature: `parse_pdf(pdf_path: str) -> list[dict]`
Use the `pdfplumber` library for PDF processing."#;

/// Fixed instruction block appended to every user prompt, after the excerpt
/// and schema sections.
pub const CRITICAL_INSTRUCTIONS: &str = r#"CRITICAL INSTRUCTIONS:
1. The data in the PDF snippet may not match the target CSV data. Use the snippet only to understand the text layout and column structure.
2. Your parser's output format must exactly match the TARGET CSV FORMAT: same keys, same key order, same value formatting.
3. Columns that are always empty in the example rows must be emitted as empty strings ("").
4. Skip any line that does not start a transaction record.
5. Output only valid Python code with the signature `parse_pdf(pdf_path: str) -> list[dict]`."#;

/// Build the corrective-feedback block embedded in a retry prompt.
///
/// The failure text is included verbatim — the contract checker and the
/// harness both write messages specific enough to steer the next attempt.
pub fn feedback_context(failure: &str) -> String {
    format!("Previous attempt failed. Feedback:\n{failure}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_pins_the_function_contract() {
        assert!(SYSTEM_PROMPT.contains("parse_pdf(pdf_path: str) -> list[dict]"));
        assert!(SYSTEM_PROMPT.contains("pdfplumber"));
    }

    #[test]
    fn feedback_context_keeps_failure_verbatim() {
        let ctx = feedback_context("row count mismatch: expected 12, got 0");
        assert!(ctx.contains("row count mismatch: expected 12, got 0"));
    }
}
