use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::error::SourceError;

/// One export parsed into memory. Rows keep their source order.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    headers: StringRecord,
    index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

/// Borrowed view of a single row, resolved through the table's header.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// Value of `column`, or `None` when the header lacks the column or the
    /// row is too short to reach it.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = *self.table.index.get(column)?;
        self.record.get(position)
    }
}

impl Table {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::SourceUnavailable {
                path: path.to_path_buf(),
            });
        }

        if !path.is_file() {
            return Err(SourceError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        Self::from_reader(file, delimiter, path)
    }

    /// Parses a header row followed by data rows. `origin` is only used to
    /// label errors and logs.
    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: u8,
        origin: impl Into<PathBuf>,
    ) -> Result<Self, SourceError> {
        let start_time = Instant::now();
        let path = origin.into();

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| malformed(&path, e))?
            .clone();

        let mut index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            index.insert(name.to_string(), position);
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(result.map_err(|e| malformed(&path, e))?);
        }

        info!(
            action = "complete",
            component = "source_parse",
            path = ?path,
            column_count = headers.len(),
            row_count = rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Parsed source export"
        );

        Ok(Self {
            path,
            headers,
            index,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |record| Row {
            table: self,
            record,
        })
    }

    /// Values of `column` in source order. Rows lacking the column are
    /// skipped; empty values are kept.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows().filter_map(move |row| row.get(column))
    }

    /// Rows that contribute nothing to a key set built from `column`.
    pub fn skipped_rows(&self, column: &str) -> usize {
        self.rows()
            .filter(|row| row.get(column).map_or(true, str::is_empty))
            .count()
    }
}

fn malformed(path: &Path, error: csv::Error) -> SourceError {
    let line = error.position().map_or(0, |position| position.line());
    SourceError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        source: error,
    }
}
