//! Sample loading: resolve one bank's (PDF, CSV) pair into a [`Sample`].
//!
//! ## Why tolerate unreadable PDF text?
//!
//! The excerpt exists only to show the model the statement's line layout.
//! The component that must actually read the PDF is the *generated parser*,
//! which opens the file itself with its own library. A PDF our extractor
//! cannot decode is therefore not fatal — the prompt carries a placeholder
//! and the attempt proceeds. Missing files, by contrast, fail fast: without
//! the CSV there is no contract to check against, so nothing may run.

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::table::Table;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Placeholder excerpt used when PDF text extraction fails.
pub const UNREADABLE_PDF_PLACEHOLDER: &str = "Could not read PDF content.";

/// One bank's sample pair, loaded once per run.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Bank identifier the paths were derived from.
    pub bank: String,
    /// Path of the sample statement PDF, handed to the generated parser.
    pub pdf_path: PathBuf,
    /// Extracted PDF text, truncated to the configured excerpt length.
    pub pdf_excerpt: String,
    /// The target table the generated parser must reproduce.
    pub expected: Table,
}

/// Load the sample pair for `bank` under the config's data layout.
///
/// Fails with [`AgentError::MissingSample`] naming the first absent file;
/// both files are checked before any extraction work starts.
pub async fn load_sample(bank: &str, config: &AgentConfig) -> Result<Sample, AgentError> {
    let bank_dir = config.data_dir.join(bank);
    let pdf_path = bank_dir.join(format!("{bank}_sample.pdf"));
    let csv_path = bank_dir.join(format!("{bank}_sample.csv"));

    for path in [&pdf_path, &csv_path] {
        if !path.exists() {
            return Err(AgentError::MissingSample {
                bank: bank.to_string(),
                path: path.clone(),
            });
        }
    }

    let expected = Table::from_csv_path(&csv_path)?;
    debug!(
        "Loaded target schema: {} columns, {} rows",
        expected.columns.len(),
        expected.row_count()
    );

    // pdf-extract walks the whole document synchronously; keep it off the
    // async executor.
    let extract_path = pdf_path.clone();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&extract_path))
        .await
        .map_err(|e| AgentError::Internal(format!("extraction task panicked: {e}")))?;

    let pdf_excerpt = match extracted {
        Ok(text) => truncate_chars(&text, config.pdf_excerpt_chars),
        Err(e) => {
            warn!("PDF text extraction failed for {}: {e}", pdf_path.display());
            UNREADABLE_PDF_PLACEHOLDER.to_string()
        }
    };

    Ok(Sample {
        bank: bank.to_string(),
        pdf_path,
        pdf_excerpt,
        expected,
    })
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_with_data_dir(dir: &std::path::Path) -> AgentConfig {
        let mut c = AgentConfig::default();
        c.data_dir = dir.to_path_buf();
        c
    }

    #[tokio::test]
    async fn missing_pdf_fails_with_missing_sample() {
        let tmp = tempfile::tempdir().unwrap();
        let bank_dir = tmp.path().join("icici");
        fs::create_dir_all(&bank_dir).unwrap();
        fs::write(bank_dir.join("icici_sample.csv"), "Date,Amount\n").unwrap();

        let err = load_sample("icici", &config_with_data_dir(tmp.path()))
            .await
            .unwrap_err();
        match err {
            AgentError::MissingSample { bank, path } => {
                assert_eq!(bank, "icici");
                assert!(path.ends_with("icici_sample.pdf"));
            }
            other => panic!("expected MissingSample, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_csv_fails_with_missing_sample() {
        let tmp = tempfile::tempdir().unwrap();
        let bank_dir = tmp.path().join("sbi");
        fs::create_dir_all(&bank_dir).unwrap();
        fs::write(bank_dir.join("sbi_sample.pdf"), "%PDF-1.4\n").unwrap();

        let err = load_sample("sbi", &config_with_data_dir(tmp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingSample { .. }));
    }

    #[tokio::test]
    async fn undecodable_pdf_yields_placeholder_excerpt() {
        let tmp = tempfile::tempdir().unwrap();
        let bank_dir = tmp.path().join("hdfc");
        fs::create_dir_all(&bank_dir).unwrap();
        // Not a decodable PDF body; existence check passes, extraction fails.
        fs::write(bank_dir.join("hdfc_sample.pdf"), "%PDF-1.4 garbage").unwrap();
        fs::write(
            bank_dir.join("hdfc_sample.csv"),
            "Date,Description,Balance\n01-01-2025,OPENING,100.00\n",
        )
        .unwrap();

        let sample = load_sample("hdfc", &config_with_data_dir(tmp.path()))
            .await
            .unwrap();
        assert_eq!(sample.pdf_excerpt, UNREADABLE_PDF_PLACEHOLDER);
        assert_eq!(sample.expected.columns, vec!["Date", "Description", "Balance"]);
        assert_eq!(sample.expected.row_count(), 1);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
