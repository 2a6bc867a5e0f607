//! Column profiling and semantic type inference.
//!
//! Each header of a [`Dataset`] becomes one [`ColumnProfile`]. The type
//! decision is a strict cascade: a column is [`ColumnType::Number`] when more
//! than `numeric_ratio` of its present values parse as finite numbers, else
//! [`ColumnType::Date`] when more than `date_ratio` parse as calendar dates,
//! else [`ColumnType::String`]. Malformed cells only lower the qualifying
//! count; they are never dropped from the profile.

use std::{collections::HashSet, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{config::InferenceOptions, dataset::Dataset};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ColumnType::String),
            "number" | "numeric" => Ok(ColumnType::Number),
            "date" => Ok(ColumnType::Date),
            other => Err(anyhow!("Unknown column type '{other}'")),
        }
    }
}

/// Inferred type and statistics for one column. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Present raw values in row order.
    pub values: Vec<String>,
    pub unique_count: usize,
    pub null_count: usize,
}

impl ColumnProfile {
    pub fn total_count(&self) -> usize {
        self.values.len() + self.null_count
    }

    /// Share of rows holding a present value; `1.0` for an empty dataset.
    pub fn completeness(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            1.0
        } else {
            self.values.len() as f64 / total as f64
        }
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct TypeCandidate {
    present: usize,
    numeric_matches: usize,
    date_matches: usize,
}

impl TypeCandidate {
    fn update(&mut self, raw: &str, numeric: bool, options: &InferenceOptions) {
        self.present += 1;
        if numeric {
            self.numeric_matches += 1;
        }
        if is_calendar_date(raw, options) {
            self.date_matches += 1;
        }
    }

    fn decide(&self, options: &InferenceOptions) -> ColumnType {
        let present = self.present as f64;
        if self.numeric_matches as f64 > present * options.numeric_ratio {
            ColumnType::Number
        } else if self.date_matches as f64 > present * options.date_ratio {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }
}

pub fn infer_schema(dataset: &Dataset) -> Vec<ColumnProfile> {
    infer_schema_with(dataset, &InferenceOptions::default())
}

pub fn infer_schema_with(dataset: &Dataset, options: &InferenceOptions) -> Vec<ColumnProfile> {
    dataset
        .headers()
        .iter()
        .map(|header| profile_column(dataset, header, options))
        .collect()
}

fn profile_column(dataset: &Dataset, header: &str, options: &InferenceOptions) -> ColumnProfile {
    let mut candidate = TypeCandidate::default();
    let mut values = Vec::new();
    let mut distinct = HashSet::new();
    let mut null_count = 0usize;

    for cell in dataset.column(header) {
        match cell.raw() {
            Some(raw) => {
                candidate.update(raw, cell.number().is_some(), options);
                distinct.insert(raw.trim());
                values.push(raw.to_string());
            }
            None => null_count += 1,
        }
    }

    let column_type = candidate.decide(options);
    debug!(
        "Column '{header}': {column_type} ({} numeric, {} date of {} present, {} null)",
        candidate.numeric_matches, candidate.date_matches, candidate.present, null_count
    );

    ColumnProfile {
        name: header.to_string(),
        column_type,
        unique_count: distinct.len(),
        values,
        null_count,
    }
}

fn is_calendar_date(raw: &str, options: &InferenceOptions) -> bool {
    let trimmed = raw.trim();
    if trimmed.chars().count() < options.min_date_length {
        return false;
    }
    parse_calendar_date(trimmed)
        .is_some_and(|date| date.year() > options.min_year && date.year() < options.max_year)
}

/// Recognizes the date layouts commonly found in exported spreadsheets.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.date_naive());
    }
    if let Some(date) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(date.date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Some(date);
    }
    parse_partial_date(value)
}

/// `YYYY` and `YYYY-MM` resolve to the first day of the period.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    let (year, month) = match value.split_once(['-', '/']) {
        Some((year, month)) => (year, month),
        None => (value, "1"),
    };
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}
