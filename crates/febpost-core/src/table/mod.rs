//! In-memory model of the delimited tables passed between stages.
//!
//! Cells are kept as text so that writing a table and reading it back yields
//! the same bytes; numeric views are parsed on demand.

mod serialization;

pub use serialization::{normalize_text_artifact, render_numeric, write_text_artifact};

use crate::domain::{PostError, PostResult};
use std::fs;
use std::path::Path;

pub const DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> PostResult<Self> {
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ragged_row_error(row_index, columns.len(), row.len()));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Numeric view of one column. Every cell must parse as a finite-or-not
    /// `f64`; the offending cell is named otherwise.
    pub fn numeric_column(&self, name: &str) -> PostResult<Vec<f64>> {
        let index = self.column_index(name).ok_or_else(|| {
            PostError::insufficient_input(
                "INPUT.TABLE_MISSING_COLUMN",
                format!("table does not contain a '{name}' column"),
            )
        })?;

        let mut values = Vec::with_capacity(self.rows.len());
        for (row_index, row) in self.rows.iter().enumerate() {
            let cell = row[index].trim();
            let value = cell.parse::<f64>().map_err(|_| {
                PostError::insufficient_input(
                    "INPUT.TABLE_NUMERIC",
                    format!(
                        "column '{name}' row {row_index} value '{cell}' is not numeric"
                    ),
                )
            })?;
            values.push(value);
        }
        Ok(values)
    }

    /// Insert or replace a column. Re-running a derivation against the same
    /// save file replaces its previous output instead of stacking duplicates.
    pub fn upsert_column(&mut self, name: &str, values: Vec<String>) -> PostResult<()> {
        if values.len() != self.rows.len() {
            return Err(PostError::insufficient_input(
                "INPUT.TABLE_COLUMN_LENGTH",
                format!(
                    "column '{name}' has {} values for {} rows",
                    values.len(),
                    self.rows.len()
                ),
            ));
        }

        if let Some(index) = self.column_index(name) {
            for (row, value) in self.rows.iter_mut().zip(values) {
                row[index] = value;
            }
            return Ok(());
        }

        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn upsert_numeric_column(&mut self, name: &str, values: &[f64]) -> PostResult<()> {
        self.upsert_column(name, values.iter().copied().map(render_numeric).collect())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> PostResult<()> {
        if row.len() != self.columns.len() {
            return Err(ragged_row_error(self.rows.len(), self.columns.len(), row.len()));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn read_delimited(path: &Path) -> PostResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            PostError::io_system(
                "IO.TABLE_READ",
                format!("failed to read table '{}': {}", path.display(), source),
            )
        })?;
        Self::parse_delimited(&source, path)
    }

    fn parse_delimited(source: &str, path: &Path) -> PostResult<Self> {
        let mut lines = source.lines();
        let header = lines.next().ok_or_else(|| {
            PostError::insufficient_input(
                "INPUT.TABLE_HEADER",
                format!("table '{}' has no header row", path.display()),
            )
        })?;

        let columns: Vec<String> = header.split(DELIMITER).map(str::to_string).collect();
        let mut rows = Vec::new();
        for (line_index, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let cells: Vec<String> = line.split(DELIMITER).map(str::to_string).collect();
            if cells.len() != columns.len() {
                return Err(ragged_row_error(line_index, columns.len(), cells.len()));
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    pub fn render_delimited(&self) -> String {
        let mut rendered = self.columns.join(",");
        rendered.push('\n');
        for row in &self.rows {
            rendered.push_str(&row.join(","));
            rendered.push('\n');
        }
        rendered
    }

    pub fn write_delimited(&self, path: &Path) -> PostResult<()> {
        write_text_artifact(path, &self.render_delimited()).map_err(|source| {
            PostError::io_system(
                "IO.TABLE_WRITE",
                format!("failed to write table '{}': {}", path.display(), source),
            )
        })
    }
}

fn ragged_row_error(row_index: usize, expected: usize, actual: usize) -> PostError {
    PostError::insufficient_input(
        "INPUT.TABLE_RAGGED_ROW",
        format!("row {row_index} has {actual} fields, header has {expected}"),
    )
}
