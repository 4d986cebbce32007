//! Tabular tearsheet: one column per portfolio, one row per metric.

use serde::Serialize;
use std::fmt;

/// A portfolio's metrics as ordered `(label, value)` pairs.
pub type PortfolioPanel = Vec<(String, f64)>;

/// Metrics table with labelled rows and portfolio columns.
///
/// Serialises as `{"index": [...], "columns": [...], "data": [[...]]}` with
/// `data` row-major; missing cells are `NaN` (JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TearsheetTable {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl TearsheetTable {
    /// Build a table from named panels.
    ///
    /// Rows are the union of panel labels in first-seen order; a cell is
    /// `NaN` when its portfolio's panel lacks that label.
    pub fn from_panels(panels: Vec<(String, PortfolioPanel)>) -> Self {
        let mut index: Vec<String> = Vec::new();
        for (_, panel) in &panels {
            for (label, _) in panel {
                if !index.contains(label) {
                    index.push(label.clone());
                }
            }
        }

        let mut data = vec![vec![f64::NAN; panels.len()]; index.len()];
        for (col, (_, panel)) in panels.iter().enumerate() {
            for (label, value) in panel {
                if let Some(row) = index.iter().position(|l| l == label) {
                    data[row][col] = *value;
                }
            }
        }

        Self {
            index,
            columns: panels.into_iter().map(|(name, _)| name).collect(),
            data,
        }
    }

    /// Row labels.
    pub fn rows(&self) -> &[String] {
        &self.index
    }

    /// Portfolio names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    /// Number of portfolios.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Cell value; `NaN` when the portfolio has no value for the row.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.index.iter().position(|l| l == row)?;
        let c = self.columns.iter().position(|n| n == column)?;
        Some(self.data[r][c])
    }

    /// One portfolio's values in row order.
    pub fn column(&self, column: &str) -> Option<Vec<f64>> {
        let c = self.columns.iter().position(|n| n == column)?;
        Some(self.data.iter().map(|row| row[c]).collect())
    }

    /// Iterate over `(row label, values)`.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().map(Vec::as_slice))
    }

    fn label_width(&self) -> usize {
        self.index
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(6)
    }

    fn column_width(&self) -> usize {
        self.columns
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(10)
    }

    /// Render as ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let label_width = self.label_width();
        let width = self.column_width();
        let total_width = label_width + (width + 2) * self.columns.len();

        let mut output = String::new();
        output.push_str(&format!("{:<label_width$}", "Metric"));
        for name in &self.columns {
            output.push_str(&format!("  {name:>width$}"));
        }
        output.push('\n');
        output.push_str(&"-".repeat(total_width));
        output.push('\n');

        for (label, values) in self.iter_rows() {
            output.push_str(&format!("{label:<label_width$}"));
            for value in values {
                output.push_str(&format!("  {:>width$}", format_cell(*value, 4)));
            }
            output.push('\n');
        }
        output
    }

    /// Render as Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("| Metric |");
        for name in &self.columns {
            output.push_str(&format!(" {name} |"));
        }
        output.push('\n');
        output.push_str("|--------|");
        for _ in &self.columns {
            output.push_str("---:|");
        }
        output.push('\n');

        for (label, values) in self.iter_rows() {
            output.push_str(&format!("| {label} |"));
            for value in values {
                output.push_str(&format!(" {} |", format_cell(*value, 4)));
            }
            output.push('\n');
        }
        output
    }
}

fn format_cell(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.precision$}")
    }
}

impl fmt::Display for TearsheetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panels() -> Vec<(String, PortfolioPanel)> {
        vec![
            (
                "Long".to_string(),
                vec![("Alpha".to_string(), 0.1), ("Covariance".to_string(), 0.02)],
            ),
            (
                "Short".to_string(),
                vec![
                    ("Beta".to_string(), 0.3),
                    ("Alpha".to_string(), 0.2),
                    ("Covariance".to_string(), -0.01),
                ],
            ),
        ]
    }

    #[test]
    fn test_rows_are_union_in_first_seen_order() {
        let table = TearsheetTable::from_panels(panels());
        assert_eq!(table.rows(), ["Alpha", "Covariance", "Beta"]);
        assert_eq!(table.columns(), ["Long", "Short"]);
        assert_eq!(table.get("Alpha", "Short"), Some(0.2));
        assert!(table.get("Beta", "Long").unwrap().is_nan());
        assert_eq!(table.get("Gamma", "Long"), None);
    }

    #[test]
    fn test_column() {
        let table = TearsheetTable::from_panels(panels());
        assert_eq!(table.column("Short"), Some(vec![0.2, -0.01, 0.3]));
        assert!(table.column("Other").is_none());
    }

    #[test]
    fn test_ascii_table() {
        let ascii = TearsheetTable::from_panels(panels()).to_ascii_table();
        let lines: Vec<&str> = ascii.lines().collect();

        assert!(lines[0].starts_with("Metric"));
        assert!(lines[0].contains("Long"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].contains("0.1000"));
        assert!(lines[4].contains('-'));
    }

    #[test]
    fn test_markdown() {
        let markdown = TearsheetTable::from_panels(panels()).to_markdown();
        assert!(markdown.starts_with("| Metric | Long | Short |"));
        assert!(markdown.contains("| Beta | - | 0.3000 |"));
    }

    #[test]
    fn test_empty_table() {
        let table = TearsheetTable::from_panels(Vec::new());
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.n_columns(), 0);
        assert_eq!(table.to_ascii_table().lines().count(), 2);
    }
}
