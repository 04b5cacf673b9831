//! Contract checker: compare the produced table to the target schema.
//!
//! Checks run in a fixed order and stop at the first mismatch: column names
//! and order, per-column types, row count, then cell values. Ordering
//! matters for feedback quality — "your columns are in the wrong order" is
//! actionable in one edit, while a wall of per-cell diffs caused by that
//! same swap is noise.
//!
//! ## Normalisation policy
//!
//! Cells are compared after trimming ASCII whitespace. When the *expected*
//! column is numeric, both cells are parsed as numbers (digit grouping
//! stripped) and compared exactly, so `1,000.00` and `1000.00` agree but
//! `1000.001` does not. Everything else is case-sensitive string equality,
//! and an empty expected cell requires an empty produced cell. The target
//! CSV is the sole authority: no leniency it cannot itself express.

use crate::table::{parse_number, ColumnType, Table};

/// Pass/fail outcome of one contract check.
///
/// The fail detail is the literal feedback for the next attempt, so it
/// always names the first offending column or cell.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Verdict {
    Pass,
    Fail { detail: String },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// The failure detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { detail } => Some(detail),
        }
    }

    fn fail(detail: impl Into<String>) -> Self {
        Verdict::Fail {
            detail: detail.into(),
        }
    }
}

/// Compare a produced table against the expected one.
pub fn check_table(produced: &Table, expected: &Table) -> Verdict {
    // Column names and order. An order-only difference gets its own message.
    if produced.columns != expected.columns {
        let same_set = {
            let mut a = produced.columns.clone();
            let mut b = expected.columns.clone();
            a.sort();
            b.sort();
            a == b
        };
        if same_set {
            return Verdict::fail(format!(
                "column order differs: expected {:?}, got {:?}",
                expected.columns, produced.columns
            ));
        }
        return Verdict::fail(format!(
            "column mismatch: expected {:?}, got {:?}",
            expected.columns, produced.columns
        ));
    }

    // Column types, inferred on both sides.
    let expected_types = expected.column_types();
    let produced_types = produced.column_types();
    for (idx, (exp, got)) in expected_types.iter().zip(&produced_types).enumerate() {
        if exp != got {
            return Verdict::fail(format!(
                "column '{}' should be {} but the produced values are {}",
                expected.columns[idx],
                describe(*exp),
                describe(*got),
            ));
        }
    }

    // Row count.
    if produced.row_count() != expected.row_count() {
        return Verdict::fail(format!(
            "row count mismatch: expected {}, got {}",
            expected.row_count(),
            produced.row_count()
        ));
    }

    // Cell values.
    for (row_idx, (exp_row, got_row)) in expected.rows.iter().zip(&produced.rows).enumerate() {
        for (col_idx, (exp_cell, got_cell)) in exp_row.iter().zip(got_row).enumerate() {
            if !cells_equal(exp_cell, got_cell, expected_types[col_idx]) {
                return Verdict::fail(format!(
                    "value mismatch at row {}, column '{}': expected '{}', got '{}'",
                    row_idx + 1,
                    expected.columns[col_idx],
                    exp_cell.trim(),
                    got_cell.trim(),
                ));
            }
        }
    }

    Verdict::Pass
}

fn describe(t: ColumnType) -> &'static str {
    match t {
        ColumnType::Number => "numeric",
        ColumnType::Text => "text",
    }
}

/// Compare two cells under the column's expected type.
fn cells_equal(expected: &str, produced: &str, column_type: ColumnType) -> bool {
    let expected = expected.trim();
    let produced = produced.trim();

    if expected.is_empty() || produced.is_empty() {
        return expected == produced;
    }

    if column_type == ColumnType::Number {
        if let (Some(a), Some(b)) = (parse_number(expected), parse_number(produced)) {
            return a == b;
        }
    }

    expected == produced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn expected() -> Table {
        table(
            &["Date", "Description", "Debit Amt", "Credit Amt", "Balance"],
            &[
                &["01-01-2025", "UPI/COFFEE 120.00", "", "", "4,880.00"],
                &["02-01-2025", "SALARY 50000.00", "", "", "54,880.00"],
            ],
        )
    }

    #[test]
    fn identical_tables_pass() {
        assert!(check_table(&expected(), &expected()).is_pass());
    }

    #[test]
    fn column_order_only_difference_fails() {
        let produced = table(
            &["Description", "Date", "Debit Amt", "Credit Amt", "Balance"],
            &[
                &["UPI/COFFEE 120.00", "01-01-2025", "", "", "4,880.00"],
                &["SALARY 50000.00", "02-01-2025", "", "", "54,880.00"],
            ],
        );
        let verdict = check_table(&produced, &expected());
        let detail = verdict.detail().expect("must fail");
        assert!(detail.contains("column order differs"), "got: {detail}");
    }

    #[test]
    fn missing_column_fails_with_both_sets() {
        let produced = table(&["Date", "Description"], &[&["01-01-2025", "x"]]);
        let detail = check_table(&produced, &expected()).detail().unwrap().to_string();
        assert!(detail.contains("column mismatch"));
        assert!(detail.contains("Balance"));
    }

    #[test]
    fn numeric_cells_compare_after_normalisation() {
        let mut produced = expected();
        produced.rows[0][4] = "4880.00".into(); // grouping dropped, same value
        assert!(check_table(&produced, &expected()).is_pass());
    }

    #[test]
    fn numeric_value_drift_fails_with_location() {
        let mut produced = expected();
        produced.rows[1][4] = "54880.01".into();
        let detail = check_table(&produced, &expected()).detail().unwrap().to_string();
        assert!(detail.contains("row 2"), "got: {detail}");
        assert!(detail.contains("Balance"), "got: {detail}");
        assert!(detail.contains("54880.01"), "got: {detail}");
    }

    #[test]
    fn row_count_mismatch_fails_before_cell_diffing() {
        let produced = table(
            &["Date", "Description", "Debit Amt", "Credit Amt", "Balance"],
            &[&["01-01-2025", "UPI/COFFEE 120.00", "", "", "4,880.00"]],
        );
        let detail = check_table(&produced, &expected()).detail().unwrap().to_string();
        assert!(detail.contains("row count mismatch: expected 2, got 1"));
    }

    #[test]
    fn empty_expected_cell_requires_empty_produced_cell() {
        let mut produced = expected();
        produced.rows[0][2] = "120.00".into(); // Debit Amt must stay empty
        let detail = check_table(&produced, &expected()).detail().unwrap().to_string();
        assert!(detail.contains("Debit Amt"), "got: {detail}");
    }

    #[test]
    fn text_comparison_is_case_sensitive() {
        let mut produced = expected();
        produced.rows[0][1] = "upi/coffee 120.00".into();
        assert!(!check_table(&produced, &expected()).is_pass());
    }
}
