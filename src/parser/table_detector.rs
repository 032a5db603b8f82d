//! Table detection from text alignment.
//!
//! Tables without ruling lines are found by grouping glyph runs into rows and
//! looking for left edges that line up across several consecutive rows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::layout::GlyphRun;

/// Width of the buckets used to match left edges (points).
const EDGE_BUCKET: f32 = 5.0;

/// Distance within which a run counts as aligned with a column edge (points).
const ALIGN_TOLERANCE: f32 = 5.0;

/// Row count above which a narrow region is assumed to be running text.
const LONG_REGION_ROWS: usize = 10;

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Baseline of the first row (PDF coordinates, y up)
    pub top_y: f32,
    /// Font size of the first row
    pub font_size: f32,
    /// Cell text, row by row. Rows may have empty cells.
    pub rows: Vec<Vec<String>>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping runs into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum fraction of a row's runs that must sit on column edges
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Runs sharing a baseline, referenced by index into the page's runs.
#[derive(Debug, Clone)]
struct Row {
    y: f32,
    members: Vec<usize>,
}

/// Detects tables among a page's glyph runs.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Split `runs` into detected tables and the runs that belong to none.
    pub fn detect(&self, runs: Vec<GlyphRun>) -> (Vec<DetectedTable>, Vec<GlyphRun>) {
        if runs.len() < self.config.min_rows * self.config.min_columns {
            return (vec![], runs);
        }

        let rows = self.group_into_rows(&runs);
        if rows.len() < self.config.min_rows {
            return (vec![], runs);
        }

        let columns = self.column_edges(&runs, &rows);
        if columns.len() < self.config.min_columns {
            log::trace!("TableDetector: {} column edges, no table", columns.len());
            return (vec![], runs);
        }

        let mut tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start, end) in self.find_regions(&runs, &rows, &columns) {
            let region = &rows[start..=end];
            let region_columns = self.column_edges(&runs, region);

            if let Some(reason) = self.reject_reason(&runs, region, &region_columns) {
                log::debug!(
                    "TableDetector: skipping {}-row region ({})",
                    region.len(),
                    reason
                );
                continue;
            }

            let first = &runs[region[0].members[0]];
            tables.push(DetectedTable {
                top_y: region[0].y,
                font_size: first.font_size,
                rows: region
                    .iter()
                    .map(|row| cells_for_row(&runs, row, &region_columns))
                    .collect(),
            });
            used.extend(region.iter().flat_map(|row| row.members.iter().copied()));
        }

        if !tables.is_empty() {
            log::debug!("TableDetector: found {} tables", tables.len());
        }

        let remaining = runs
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, run)| run)
            .collect();

        (tables, remaining)
    }

    /// Group runs into rows, top of page first.
    fn group_into_rows(&self, runs: &[GlyphRun]) -> Vec<Row> {
        let mut order: Vec<usize> = (0..runs.len()).collect();
        order.sort_by(|&a, &b| {
            match runs[b].y.partial_cmp(&runs[a].y).unwrap_or(Ordering::Equal) {
                Ordering::Equal => runs[a].x.partial_cmp(&runs[b].x).unwrap_or(Ordering::Equal),
                other => other,
            }
        });

        let mut rows: Vec<Row> = Vec::new();
        for idx in order {
            let run = &runs[idx];
            let tolerance = run.font_size * self.config.y_tolerance_factor;
            match rows.last_mut() {
                Some(row) if (runs[row.members[0]].y - run.y).abs() <= tolerance => {
                    row.members.push(idx);
                }
                _ => rows.push(Row {
                    y: run.y,
                    members: vec![idx],
                }),
            }
        }

        for row in &mut rows {
            row.y = row.members.iter().map(|&i| runs[i].y).sum::<f32>() / row.members.len() as f32;
        }
        rows
    }

    /// Left edges shared by enough rows, merged when closer than the minimum gap.
    fn column_edges(&self, runs: &[GlyphRun], rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|r| r.members.len() >= 2).collect();
        // With few multi-run rows, count every row.
        let candidates: Vec<&Row> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };
        if candidates.is_empty() {
            return vec![];
        }

        let mut counts: HashMap<i32, usize> = HashMap::new();
        for row in &candidates {
            let buckets: HashSet<i32> = row
                .members
                .iter()
                .map(|&i| (runs[i].x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((candidates.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous stretches of well-aligned multi-run rows.
    fn find_regions(&self, runs: &[GlyphRun], rows: &[Row], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = row.members.len() >= 2
                && alignment_score(runs, row, columns) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= self.config.min_rows {
                        regions.push((s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }
        regions
    }

    /// Why a candidate region is not a table, if it isn't.
    fn reject_reason(&self, runs: &[GlyphRun], region: &[Row], columns: &[f32]) -> Option<&'static str> {
        if columns.len() < self.config.min_columns {
            Some("too few columns")
        } else if columns.len() > self.config.max_columns {
            Some("too many columns")
        } else if region.len() > LONG_REGION_ROWS && columns.len() < 3 {
            Some("long and narrow")
        } else if is_list_pattern(runs, region, columns) {
            Some("list pattern")
        } else {
            None
        }
    }
}

/// Fraction of a row's runs that start on a column edge.
fn alignment_score(runs: &[GlyphRun], row: &Row, columns: &[f32]) -> f32 {
    if row.members.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .members
        .iter()
        .filter(|&&i| columns.iter().any(|col| (runs[i].x - col).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.members.len() as f32
}

/// Distribute a row's runs over the columns, one cell per column.
fn cells_for_row(runs: &[GlyphRun], row: &Row, columns: &[f32]) -> Vec<String> {
    let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
    let mut members = row.members.clone();
    members.sort_by(|&a, &b| runs[a].x.partial_cmp(&runs[b].x).unwrap_or(Ordering::Equal));

    for i in members {
        let col = column_for_x(runs[i].x, columns);
        cells[col].push(runs[i].text.trim());
    }
    cells.into_iter().map(|parts| parts.join(" ")).collect()
}

/// Index of the column a left edge falls in, allowing 10pt of slack before
/// the edge.
fn column_for_x(x: f32, columns: &[f32]) -> usize {
    columns
        .iter()
        .rposition(|&edge| x >= edge - 10.0)
        .unwrap_or(0)
}

/// Rows whose first cell is a bullet or number marker read as a list, not a
/// table.
fn is_list_pattern(runs: &[GlyphRun], region: &[Row], columns: &[f32]) -> bool {
    if columns.len() < 2 || region.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in region {
        let first = row
            .members
            .iter()
            .map(|&i| &runs[i])
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        if let Some(run) = first {
            let text = run.text.trim();
            if is_bullet_marker(text) {
                bullets += 1;
            } else if is_number_marker(text) {
                numbers += 1;
            }
        }
    }

    let rows = region.len() as f32;
    if bullets as f32 / rows >= 0.5 {
        return true;
    }
    // Numbered first columns are common in real tables; only two-column
    // regions are treated as lists.
    columns.len() == 2 && (bullets + numbers) as f32 / rows >= 0.5
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// Check if text is a number-style list marker ("1.", "2)", "a.", "3").
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let mut chars = cleaned.chars();
    let last = chars.next_back();
    let body = chars.as_str();
    let closes = matches!(last, Some('.') | Some(')'));

    closes
        && !body.is_empty()
        && (body.chars().all(|c| c.is_ascii_digit())
            || (body.chars().count() == 1 && body.chars().all(char::is_alphabetic)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun::new(text.to_string(), x, y, 12.0, "Helvetica".to_string())
    }

    fn grid(rows: &[&[&str]], xs: &[f32], top: f32) -> Vec<GlyphRun> {
        rows.iter()
            .enumerate()
            .flat_map(|(r, cells)| {
                let y = top - r as f32 * 15.0;
                cells
                    .iter()
                    .zip(xs)
                    .map(move |(text, &x)| run(text, x, y))
            })
            .collect()
    }

    #[test]
    fn test_detect_simple_table() {
        let runs = grid(
            &[&["Name", "Age"], &["Alice", "30"], &["Bob", "25"]],
            &[10.0, 60.0],
            100.0,
        );

        let (tables, remaining) = TableDetector::default().detect(runs);
        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
                vec!["Bob".to_string(), "25".to_string()],
            ]
        );
        assert_eq!(tables[0].top_y, 100.0);
    }

    #[test]
    fn test_missing_cell_leaves_empty_string() {
        let mut runs = grid(
            &[&["Item", "Qty", "Price"], &["Pen", "2", "1.50"], &["Ink", "1", "9.00"]],
            &[10.0, 100.0, 200.0],
            300.0,
        );
        runs.push(run("Pad", 10.0, 255.0));
        runs.push(run("4.00", 200.0, 255.0));

        let (tables, _) = TableDetector::default().detect(runs);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[3], vec!["Pad", "", "4.00"]);
    }

    #[test]
    fn test_table_keeps_surrounding_text() {
        let mut runs = vec![run("Intro paragraph", 10.0, 200.0)];
        runs.extend(grid(&[&["a", "b"], &["c", "d"]], &[10.0, 80.0], 150.0));
        runs.push(run("Closing words", 10.0, 50.0));

        let (tables, remaining) = TableDetector::default().detect(runs);
        assert_eq!(tables.len(), 1);
        let texts: Vec<_> = remaining.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro paragraph", "Closing words"]);
    }

    #[test]
    fn test_no_table_single_column() {
        let runs = vec![run("Line 1", 10.0, 100.0), run("Line 2", 10.0, 85.0), run("Line 3", 10.0, 70.0)];
        let (tables, remaining) = TableDetector::default().detect(runs);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 3);
    }

    #[test]
    fn test_long_two_column_region_rejected() {
        let rows: Vec<[&str; 2]> = (0..12).map(|_| ["label", "value"]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| &r[..]).collect();
        let runs = grid(&rows, &[10.0, 120.0], 600.0);

        let (tables, remaining) = TableDetector::default().detect(runs);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 24);
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let runs = grid(
            &[&["1.", "Install"], &["2.", "Configure"], &["3.", "Run"]],
            &[50.0, 80.0],
            400.0,
        );
        let (tables, remaining) = TableDetector::default().detect(runs);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 6);
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let runs = grid(
            &[&["•", "Management"], &["•", "Firmware"], &["•", "Service"]],
            &[50.0, 80.0],
            400.0,
        );
        let (tables, _) = TableDetector::default().detect(runs);
        assert!(tables.is_empty());
    }

    #[test]
    fn test_markers() {
        for marker in ["1.", "12.", "1)", "1 .", "3", "a.", "B)"] {
            assert!(is_number_marker(marker), "{marker}");
        }
        for marker in ["-", "•", "*", "–"] {
            assert!(is_bullet_marker(marker), "{marker}");
        }
        for text in ["Name", "Hello World", "ab.", ""] {
            assert!(!is_number_marker(text) && !is_bullet_marker(text), "{text}");
        }
    }

    #[test]
    fn test_column_for_x() {
        let columns = [10.0, 100.0, 200.0];
        assert_eq!(column_for_x(0.0, &columns), 0);
        assert_eq!(column_for_x(95.0, &columns), 1);
        assert_eq!(column_for_x(250.0, &columns), 2);
    }
}
