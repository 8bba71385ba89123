//! Presentation adapter: how the bot talks back to a user.

use std::future::Future;

use thiserror::Error;

use crate::session::UserId;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {method}")]
    UnexpectedStatus { status: u16, method: String },

    #[error("Bot API rejected {method}: {description}")]
    Api { method: String, description: String },

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Bot API URL: {reason}")]
    InvalidUrl { reason: String },
}

/// One button: what the user sees and what comes back when they press it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub payload: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Lays choices out two per row, in order; an odd count leaves the last row
/// with a single choice.
#[must_use]
pub fn choice_grid(choices: &[Choice]) -> Vec<Vec<Choice>> {
    choices.chunks(2).map(<[Choice]>::to_vec).collect()
}

/// Logs a reply that could not be delivered; the conversation carries on.
pub fn warn_undelivered(user: UserId, result: Result<(), TransportError>) {
    if let Err(error) = result {
        tracing::warn!(user_id = user, error = %error, "failed to deliver reply");
    }
}

/// Outbound side of the chat transport.
pub trait Presenter: Send + Sync {
    fn send_text(
        &self,
        user: UserId,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_table(
        &self,
        user: UserId,
        table: &Table,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        choices: &[Choice],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn send_document(
        &self,
        user: UserId,
        file_name: &str,
        contents: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Retrieves the image behind an inbound photo.
pub trait PhotoSource: Send + Sync {
    fn download_photo(
        &self,
        file_id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// A small text table, rendered monospace for chat or as CSV for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; missing cells render empty, extra cells are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Bordered, left-aligned monospace rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = widths.iter().fold(String::from("+"), |mut line, width| {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
            line
        });

        let mut lines = vec![
            border.clone(),
            render_row(&self.headers, &widths),
            border.clone(),
        ];
        lines.extend(self.rows.iter().map(|row| render_row(row, &widths)));
        if !self.rows.is_empty() {
            lines.push(border);
        }
        lines.join("\n")
    }

    /// Comma-separated rendering with a header line.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(&mut out, &self.headers);
        for row in &self.rows {
            write_csv_row(&mut out, row);
        }
        out
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width - cell.chars().count();
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 1));
        line.push('|');
    }
    line
}

fn write_csv_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(n: usize) -> Vec<Choice> {
        (1..=n)
            .map(|i| Choice::new(format!("c{i}"), i.to_string()))
            .collect()
    }

    #[test]
    fn grid_pairs_choices_in_order() {
        let grid = choice_grid(&choices(4));
        let labels: Vec<Vec<&str>> = grid
            .iter()
            .map(|row| row.iter().map(|c| c.label.as_str()).collect())
            .collect();
        assert_eq!(labels, vec![vec!["c1", "c2"], vec!["c3", "c4"]]);
    }

    #[test]
    fn grid_with_odd_count_ends_with_single_choice() {
        let grid = choice_grid(&choices(3));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1], vec![Choice::new("c3", "3")]);
    }

    #[test]
    fn grid_of_nothing_is_empty() {
        assert!(choice_grid(&[]).is_empty());
    }

    #[test]
    fn table_renders_bordered_columns() {
        let mut table = Table::new(&["CarId", "Name"]);
        table.push_row(vec!["1".to_string(), "Lada 2107".to_string()]);
        table.push_row(vec!["12".to_string(), "Note".to_string()]);

        let expected = "\
+-------+-----------+
| CarId | Name      |
+-------+-----------+
| 1     | Lada 2107 |
| 12    | Note      |
+-------+-----------+";
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn table_width_counts_characters_not_bytes() {
        let mut table = Table::new(&["Name"]);
        table.push_row(vec!["Фильтр".to_string()]);
        let rendered = table.render();
        assert!(rendered.contains("| Фильтр |"), "got:\n{rendered}");
        assert!(rendered.starts_with("+--------+"));
    }

    #[test]
    fn empty_table_renders_header_only() {
        let table = Table::new(&["A"]);
        assert_eq!(table.render(), "+---+\n| A |\n+---+");
    }

    #[test]
    fn rows_are_fitted_to_the_header() {
        let mut table = Table::new(&["A", "B"]);
        table.push_row(vec!["x".to_string(), "y".to_string(), "z".to_string()]);
        table.push_row(vec!["x".to_string()]);
        assert_eq!(table.to_csv(), "A,B\nx,y\nx,\n");
    }

    #[test]
    fn csv_quotes_separators_quotes_and_newlines() {
        let mut table = Table::new(&["PartNumber", "Description"]);
        table.push_row(vec!["A1".to_string(), "filter, oil".to_string()]);
        table.push_row(vec!["A2".to_string(), "say \"hi\"".to_string()]);
        table.push_row(vec!["A3".to_string(), "two\nlines".to_string()]);

        assert_eq!(
            table.to_csv(),
            "PartNumber,Description\nA1,\"filter, oil\"\nA2,\"say \"\"hi\"\"\"\nA3,\"two\nlines\"\n"
        );
    }
}
