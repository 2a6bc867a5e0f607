//! In-memory dataset model shared by every pipeline stage.
//!
//! A [`Dataset`] is an ordered header list plus positional rows of [`Cell`]
//! values. Cells are classified exactly once, when the dataset is built, so
//! downstream stages never re-inspect raw text to decide whether a value is
//! absent or numeric.

use std::{collections::HashSet, fmt, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::io_utils;

/// Label used when a grouping key is absent or empty.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Duplicate header '{0}'")]
    DuplicateHeader(String),
    #[error("Row {row} has {found} field(s) but only {expected} header(s) are defined")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Absent,
    Text(String),
    Numeric { raw: String, value: f64 },
}

impl Cell {
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            return Cell::Absent;
        }
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Numeric {
                raw: raw.to_string(),
                value,
            },
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Cell::Absent)
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Cell::Absent => None,
            Cell::Text(raw) | Cell::Numeric { raw, .. } => Some(raw),
        }
    }

    /// Strict numeric view: only cells that parsed completely as a finite number.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Numeric { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Leading-prefix numeric view (`"12kg"` → 12). Non-finite results are
    /// treated as unparseable.
    pub fn lenient_number(&self) -> Option<f64> {
        match self {
            Cell::Absent => None,
            Cell::Numeric { value, .. } => Some(*value),
            Cell::Text(raw) => parse_numeric_prefix(raw),
        }
    }

    /// Lenient number, with zero and unparseable both mapped to `fallback`.
    pub fn number_or(&self, fallback: f64) -> f64 {
        match self.lenient_number() {
            Some(value) if value != 0.0 => value,
            _ => fallback,
        }
    }

    /// Trimmed text used as a grouping key, `Unknown` for absent cells.
    pub fn label(&self) -> String {
        self.raw()
            .map(|raw| raw.trim().to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw().unwrap_or(""))
    }
}

static ABSENT: Cell = Cell::Absent;

fn numeric_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("numeric prefix pattern compiles")
    })
}

pub fn parse_numeric_prefix(raw: &str) -> Option<f64> {
    let candidate = raw.trim_start();
    let matched = numeric_prefix().find(candidate)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn get(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&ABSENT)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_present())
    }
}

/// A column position resolved once per pass; unknown names read as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef(Option<usize>);

impl ColumnRef {
    pub fn of<'r>(&self, row: &'r Row) -> &'r Cell {
        match self.0 {
            Some(index) => row.get(index),
            None => &ABSENT,
        }
    }

    pub fn exists(&self) -> bool {
        self.0.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Builds a dataset from decoded records. Short rows are padded with
    /// absent cells and rows with no present value are dropped.
    pub fn new<I, R, S>(headers: Vec<String>, records: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(DatasetError::DuplicateHeader(header.clone()));
            }
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for (row_idx, record) in records.into_iter().enumerate() {
            let mut cells = record
                .into_iter()
                .map(|value| Cell::from_raw(value.as_ref()))
                .collect::<Vec<_>>();
            if cells.len() > width {
                return Err(DatasetError::RowWidth {
                    row: row_idx + 1,
                    expected: width,
                    found: cells.len(),
                });
            }
            cells.resize(width, Cell::Absent);
            let row = Row { cells };
            if !row.is_empty() {
                rows.push(row);
            }
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn resolve(&self, name: &str) -> ColumnRef {
        ColumnRef(self.column_index(name))
    }

    /// Looks up a cell by column name; unknown columns read as absent.
    pub fn cell<'a>(&self, row: &'a Row, column: &str) -> &'a Cell {
        self.resolve(column).of(row)
    }

    /// Iterates one column's cells in row order.
    pub fn column(&self, name: &str) -> impl Iterator<Item = &Cell> + '_ {
        let column = self.resolve(name);
        self.rows.iter().map(move |row| column.of(row))
    }
}

/// Reads a delimited file (or stdin via `-`) into a [`Dataset`].
pub fn load_csv(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Dataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut records = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        records.push(io_utils::decode_record(&record, encoding)?);
    }
    let read = records.len();
    let dataset = Dataset::new(headers, records)
        .with_context(|| format!("Building dataset from {path:?}"))?;
    debug!(
        "Loaded {} row(s) from {:?} ({} empty row(s) discarded)",
        dataset.row_count(),
        path,
        read - dataset.row_count()
    );
    Ok(dataset)
}
