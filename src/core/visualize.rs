use crate::domain::model::{Table, Value};
use std::fmt::Write;

const MAX_CHART_SERIES: usize = 2;
const MAX_CELL_WIDTH: usize = 24;

/// A numeric column prepared for charting; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

pub trait ChartRenderer {
    /// Draws up to two series side by side. Returns `None` when there is nothing to draw.
    fn render_bar_chart(&self, series: &[NumericSeries]) -> Option<String>;
}

/// The first two numeric columns of `table`, in column order.
pub fn chart_series(table: &Table) -> Vec<NumericSeries> {
    table
        .numeric_columns()
        .into_iter()
        .take(MAX_CHART_SERIES)
        .map(|column| NumericSeries {
            name: column.name.clone(),
            values: column.values.iter().map(Value::as_f64).collect(),
        })
        .collect()
}

/// Horizontal bar chart drawn with block characters, one group of bars per row.
#[derive(Debug, Clone)]
pub struct TextBarChart {
    pub bar_width: usize,
    pub max_rows: usize,
}

impl Default for TextBarChart {
    fn default() -> Self {
        Self {
            bar_width: 40,
            max_rows: 20,
        }
    }
}

impl ChartRenderer for TextBarChart {
    fn render_bar_chart(&self, series: &[NumericSeries]) -> Option<String> {
        let series = &series[..series.len().min(MAX_CHART_SERIES)];
        if series.is_empty() {
            return None;
        }

        let rows = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        let scale = series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        let label_width = series.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);

        let mut out = String::new();
        for row in 0..rows.min(self.max_rows) {
            let _ = writeln!(out, "{}", row);
            for s in series {
                let value = s.values.get(row).copied().flatten();
                let _ = writeln!(
                    out,
                    "  {:<width$} |{}",
                    s.name,
                    self.bar(value, scale),
                    width = label_width
                );
            }
        }

        if rows > self.max_rows {
            let _ = writeln!(out, "... {} more rows", rows - self.max_rows);
        }

        Some(out)
    }
}

impl TextBarChart {
    fn bar(&self, value: Option<f64>, scale: f64) -> String {
        let Some(value) = value else {
            return " NA".to_string();
        };

        let length = if scale > 0.0 {
            ((value.abs() / scale) * self.bar_width as f64).round() as usize
        } else {
            0
        };
        let glyph = if value < 0.0 { "▒" } else { "█" };
        format!("{} {}", glyph.repeat(length), value)
    }
}

/// Renders the first `rows` rows as an aligned text grid with a row index column.
pub fn render_preview(table: &Table, rows: usize) -> String {
    if table.column_count() == 0 {
        return "(no columns)\n".to_string();
    }

    let head = table.head(rows);
    let index_width = head.row_count().saturating_sub(1).to_string().len();

    let cells: Vec<Vec<String>> = head
        .columns()
        .iter()
        .map(|column| {
            std::iter::once(truncate(&column.name))
                .chain(column.values.iter().map(|v| match v {
                    Value::Missing => "NaN".to_string(),
                    other => truncate(&other.to_string()),
                }))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = cells
        .iter()
        .map(|col| col.iter().map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in 0..=head.row_count() {
        let index = if line == 0 {
            String::new()
        } else {
            (line - 1).to_string()
        };
        let _ = write!(out, "{:>width$}", index, width = index_width);
        for (column, width) in cells.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", column[line], width = *width);
        }
        out.push('\n');
    }

    if table.row_count() > head.row_count() {
        let _ = writeln!(
            out,
            "[{} rows x {} columns]",
            table.row_count(),
            table.column_count()
        );
    }

    out
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        short.push_str("...");
        short
    }
}
