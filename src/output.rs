//! Text and JSON rendering for the command line.

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::db::QueryResult;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned tables and status lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Picks the format from the `--json` flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

/// Formats query results.
pub fn format_results(results: &[QueryResult], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(results),
        OutputFormat::Text => results
            .iter()
            .map(format_result_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn format_result_text(result: &QueryResult) -> String {
    let mut out = format!("> {}\n", result.query_text);

    if result.is_error {
        for message in &result.messages {
            out.push_str(&format!("ERROR: {}\n", message));
        }
        return out.trim_end().to_string();
    }

    if !result.columns.is_empty() {
        let rows: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| {
                result
                    .columns
                    .iter()
                    .map(|c| row.get(c).map(|v| v.to_display_string()).unwrap_or_default())
                    .collect()
            })
            .collect();
        out.push_str(&format_table(&result.columns, &rows));
        out.push('\n');
    }

    for message in &result.messages {
        out.push_str(message);
        out.push('\n');
    }

    if let Some(pagination) = &result.pagination {
        out.push_str(&format!(
            "Page {} ({} per page), about {} row(s) in {}\n",
            pagination.page, pagination.page_size, pagination.total, pagination.query_params
        ));
    }

    out.trim_end().to_string()
}

/// Formats catalog entries, one per line in text mode.
pub fn format_entries(entries: &[CatalogEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(entries),
        OutputFormat::Text => entries
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Formats a table as a string for display.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    output.push_str(&header_line.join(" │ "));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));
    output.push('\n');

    for row in rows {
        let row_line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = width)
            })
            .collect();
        output.push_str(&row_line.join(" │ "));
        output.push('\n');
    }

    output.trim_end().to_string()
}
