//! Table regularization.

use crate::error::Warning;

/// A rectangular table plus what was repaired to make it so.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub rows: Vec<Vec<String>>,
    /// Set when the input rows had differing lengths.
    pub warning: Option<Warning>,
}

/// Trim cells, pad short rows to the widest row, and drop rows that are empty
/// after trimming. At least one row is always kept.
pub fn normalize_table(rows: &[Vec<String>], page: u32) -> NormalizedTable {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let ragged_rows = rows.iter().filter(|r| r.len() != columns).count();

    let warning = (ragged_rows > 0).then(|| Warning::TableGeometry {
        page,
        rows: rows.len(),
        expected_columns: columns,
        ragged_rows,
    });

    let mut out: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
            cells.resize(columns, String::new());
            cells
        })
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    if out.is_empty() {
        out.push(vec![String::new(); columns]);
    }

    NormalizedTable { rows: out, warning }
}
