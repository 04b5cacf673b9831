//! The tabular model shared by the target CSV and the harness output.
//!
//! Both sides of the contract check are reduced to the same shape: ordered
//! column names plus row-major string cells. Types are not declared anywhere
//! in the inputs, so they are inferred per column — a column is `Number`
//! when every non-empty cell parses as a number, `Text` otherwise. Keeping
//! cells as strings preserves exactly what the CSV and the parser emitted;
//! numeric interpretation happens only at comparison time.

use crate::error::AgentError;
use std::path::Path;

/// Inferred data type of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    /// Every non-empty cell parses as a number (digit grouping tolerated).
    Number,
    /// Anything else, including all-empty columns.
    Text,
}

/// An ordered table: column names plus row-major cells.
///
/// Row cells are padded/truncated to the column count at construction, so
/// every accessor can index columns without bounds anxiety.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    /// Column names, in order. Order is significant for the contract check.
    pub columns: Vec<String>,
    /// Row-major cells; each row has exactly `columns.len()` entries.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, normalising each row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Load the expected table from a target CSV file.
    ///
    /// Missing trailing cells are read as empty strings (ragged rows are
    /// tolerated the same way the original format renders blanks).
    pub fn from_csv_path(path: &Path) -> Result<Self, AgentError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| AgentError::InvalidSample {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| AgentError::InvalidSample {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if columns.is_empty() {
            return Err(AgentError::InvalidSample {
                path: path.to_path_buf(),
                detail: "CSV has no header row".into(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| AgentError::InvalidSample {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self::new(columns, rows))
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// All cells of one column, by index.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }

    /// Infer the type of every column, in column order.
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|idx| infer_column_type(self.column(idx)))
            .collect()
    }

    /// The first `n` rows, for prompt rendering.
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(n)]
    }
}

/// Infer one column's type from its cells.
///
/// Empty cells are neutral: a column of dates with blanks is still `Text`,
/// a column of amounts with blanks is still `Number`. An all-empty column
/// is `Text` — there is no numeric evidence to hold the parser to.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut saw_value = false;
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        saw_value = true;
        if parse_number(cell).is_none() {
            return ColumnType::Text;
        }
    }
    if saw_value {
        ColumnType::Number
    } else {
        ColumnType::Text
    }
}

/// Parse a cell as a number, tolerating `,` digit grouping.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn rows_are_padded_to_column_count() {
        let t = table(&["a", "b", "c"], &[&["1"]]);
        assert_eq!(t.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn number_column_with_grouping_and_blanks() {
        let t = table(&["amt"], &[&["1,234.50"], &[""], &["-17"]]);
        assert_eq!(t.column_types(), vec![ColumnType::Number]);
    }

    #[test]
    fn mixed_column_is_text() {
        let t = table(&["ref"], &[&["1001"], &["TXN-1002"]]);
        assert_eq!(t.column_types(), vec![ColumnType::Text]);
    }

    #[test]
    fn all_empty_column_is_text() {
        let t = table(&["debit"], &[&[""], &[""]]);
        assert_eq!(t.column_types(), vec![ColumnType::Text]);
    }

    #[test]
    fn from_csv_reads_headers_rows_and_blanks() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "Date,Description,Amount").unwrap();
        writeln!(f, "01-01-2025,COFFEE,120.00").unwrap();
        writeln!(f, "02-01-2025,SALARY,").unwrap();
        f.flush().unwrap();

        let t = Table::from_csv_path(f.path()).unwrap();
        assert_eq!(t.columns, vec!["Date", "Description", "Amount"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.rows[1][2], "");
    }

    #[test]
    fn from_csv_missing_file_is_invalid_sample() {
        let err = Table::from_csv_path(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidSample { .. }));
    }

    #[test]
    fn parse_number_cases() {
        assert_eq!(parse_number("1,000.25"), Some(1000.25));
        assert_eq!(parse_number(" -3 "), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12/01/2025"), None);
    }
}
