//! Warehouse boundary: SQL execution against the trip dataset.
//!
//! The agent only sees the [`Warehouse`] trait and its tabular
//! [`QueryOutput`]; the BigQuery REST specifics stay in [`bigquery`].

pub mod bigquery;

pub use bigquery::BigQueryWarehouse;

use async_trait::async_trait;

use crate::error::WarehouseError;

/// A tabular query result: ordered columns, ordered rows.
///
/// Cells are already rendered to text. `None` marks a SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// True when the warehouse had more rows than were fetched.
    pub truncated: bool,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the result as a Markdown pipe table.
    ///
    /// Columns and rows keep their result order and NULLs render as empty
    /// cells, so the same result always produces the same bytes.
    pub fn to_markdown(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                let len = cell.as_deref().unwrap_or_default().chars().count();
                if len > widths[i] {
                    widths[i] = len;
                }
            }
        }

        let mut out = String::new();
        push_row(&mut out, &widths, |i| self.columns[i].as_str());
        out.push('|');
        for width in &widths {
            for _ in 0..width + 2 {
                out.push('-');
            }
            out.push('|');
        }
        out.push('\n');
        for row in &self.rows {
            push_row(&mut out, &widths, |i| {
                row.get(i).and_then(|c| c.as_deref()).unwrap_or_default()
            });
        }

        if self.truncated {
            out.push_str(&format!(
                "\n(resultado truncado: se muestran las primeras {} filas)\n",
                self.rows.len()
            ));
        }
        out
    }
}

fn push_row<'a>(out: &mut String, widths: &[usize], cell: impl Fn(usize) -> &'a str) {
    out.push('|');
    for (i, width) in widths.iter().enumerate() {
        let text = cell(i);
        out.push(' ');
        out.push_str(text);
        for _ in text.chars().count()..*width {
            out.push(' ');
        }
        out.push_str(" |");
    }
    out.push('\n');
}

/// Trait for SQL execution backends.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run one read-only SQL statement and collect its result.
    async fn run_query(&self, sql: &str) -> Result<QueryOutput, WarehouseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryOutput {
        QueryOutput {
            columns: vec!["start_station_name".to_string(), "trips".to_string()],
            rows: vec![
                vec![Some("Pershing Square North".to_string()), Some("143".to_string())],
                vec![Some("W 21 St & 6 Ave".to_string()), None],
            ],
            truncated: false,
        }
    }

    #[test]
    fn renders_aligned_pipe_table() {
        let table = sample().to_markdown();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| start_station_name    | trips |");
        assert_eq!(lines[1], "|-----------------------|-------|");
        assert_eq!(lines[2], "| Pershing Square North | 143   |");
        assert_eq!(lines[3], "| W 21 St & 6 Ave       |       |");
    }

    #[test]
    fn rendering_is_deterministic() {
        let output = sample();
        assert_eq!(output.to_markdown(), output.to_markdown());
    }

    #[test]
    fn truncated_result_carries_notice() {
        let mut output = sample();
        output.truncated = true;
        let table = output.to_markdown();
        assert!(table.contains("resultado truncado"));
        assert!(table.contains("2 filas"));
    }

    #[test]
    fn empty_result_has_no_rows() {
        let output = QueryOutput {
            columns: vec!["n".to_string()],
            rows: Vec::new(),
            truncated: false,
        };
        assert!(output.is_empty());
        assert_eq!(output.to_markdown(), "| n |\n|---|\n");
    }
}
