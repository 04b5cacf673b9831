//! User-prompt assembly for one attempt.
//!
//! The prompt is a pure function of the sample, the optional previous
//! failure, and two config knobs (excerpt length is applied at load time;
//! the sample-row count here). No timestamps, no randomness — identical
//! inputs produce identical prompts, which is what makes the feedback
//! property testable: attempt N's prompt must contain attempt N-1's failure
//! text, and nothing else about it may drift.

use crate::config::AgentConfig;
use crate::pipeline::sample::Sample;
use crate::prompts::{feedback_context, CRITICAL_INSTRUCTIONS};
use crate::table::Table;
use std::fmt::Write;

/// Assemble the user prompt for one attempt.
///
/// Sections, in order: target bank, PDF excerpt (structure evidence only),
/// target CSV schema and example rows, corrective feedback when a previous
/// attempt failed, and the fixed instruction block.
pub fn build_user_prompt(sample: &Sample, feedback: Option<&str>, config: &AgentConfig) -> String {
    let mut prompt = String::new();

    writeln!(prompt, "Target bank: {}", sample.bank).ok();
    writeln!(prompt).ok();
    writeln!(
        prompt,
        "--- RAW PDF TEXT SNIPPET (FOR STRUCTURE ANALYSIS ONLY) ---"
    )
    .ok();
    writeln!(prompt, "{}", sample.pdf_excerpt.trim_end()).ok();
    writeln!(prompt, "--- END SNIPPET ---").ok();
    writeln!(prompt).ok();
    writeln!(prompt, "--- TARGET CSV FORMAT (THIS IS THE GOAL) ---").ok();
    writeln!(prompt, "CSV schema: {:?}", sample.expected.columns).ok();
    writeln!(prompt, "Example rows to match:").ok();
    writeln!(
        prompt,
        "{}",
        render_example_rows(&sample.expected, config.prompt_sample_rows)
    )
    .ok();

    if let Some(failure) = feedback {
        writeln!(prompt).ok();
        writeln!(prompt, "{}", feedback_context(failure)).ok();
    }

    writeln!(prompt).ok();
    write!(prompt, "{CRITICAL_INSTRUCTIONS}").ok();

    prompt
}

/// Render the header plus the first `n` rows as a space-aligned block.
///
/// Alignment mirrors how the expected CSV is eyeballed by a human: every
/// column padded to its widest cell, empty cells left visibly blank.
fn render_example_rows(expected: &Table, n: usize) -> String {
    let head = expected.head(n);

    let mut widths: Vec<usize> = expected.columns.iter().map(|c| c.chars().count()).collect();
    for row in head {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_line(&mut out, &expected.columns, &widths);
    for row in head {
        out.push('\n');
        render_line(&mut out, row, &widths);
    }
    out
}

fn render_line(out: &mut String, cells: &[String], widths: &[usize]) {
    for (idx, cell) in cells.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        let pad = widths[idx].saturating_sub(cell.chars().count());
        // No trailing padding on the last column.
        if idx + 1 < cells.len() {
            for _ in 0..pad {
                out.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> Sample {
        Sample {
            bank: "icici".into(),
            pdf_path: PathBuf::from("data/icici/icici_sample.pdf"),
            pdf_excerpt: "01-01-2025 UPI/COFFEE 120.00 4880.00".into(),
            expected: Table::new(
                vec!["Date".into(), "Description".into(), "Balance".into()],
                vec![
                    vec!["01-01-2025".into(), "UPI/COFFEE".into(), "4880.00".into()],
                    vec!["02-01-2025".into(), "SALARY".into(), "54880.00".into()],
                ],
            ),
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let config = AgentConfig::default();
        let s = sample();
        let a = build_user_prompt(&s, None, &config);
        let b = build_user_prompt(&s, None, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_contains_schema_excerpt_and_instructions() {
        let config = AgentConfig::default();
        let p = build_user_prompt(&sample(), None, &config);
        assert!(p.contains("Target bank: icici"));
        assert!(p.contains("UPI/COFFEE 120.00"));
        assert!(p.contains(r#"["Date", "Description", "Balance"]"#));
        assert!(p.contains("CRITICAL INSTRUCTIONS"));
        assert!(!p.contains("Previous attempt failed"));
    }

    #[test]
    fn retry_prompt_embeds_failure_verbatim() {
        let config = AgentConfig::default();
        let failure = "value mismatch at row 3, column 'Balance': expected '4880.00', got '4880'";
        let p = build_user_prompt(&sample(), Some(failure), &config);
        assert!(p.contains(failure));
        assert!(p.contains("Previous attempt failed. Feedback:"));
    }

    #[test]
    fn example_block_is_limited_and_aligned() {
        let config = AgentConfig::builder().prompt_sample_rows(1).build().unwrap();
        let p = build_user_prompt(&sample(), None, &config);
        assert!(p.contains("01-01-2025"));
        assert!(!p.contains("02-01-2025"), "second row must be cut at n=1");
        // Header cells are padded to the widest cell in their column.
        assert!(p.contains("Date        Description  Balance"));
    }
}
