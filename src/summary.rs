//! Descriptive summaries of a profiled dataset and a keyword-routed
//! question responder built on them.

use std::fmt::Write as _;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    chart::aggregate::{mean, median, min_max},
    dataset::Dataset,
    schema::{ColumnProfile, ColumnType},
};

const OVERVIEW_KEYWORDS: &[&str] = &["overview", "summary", "describe"];
const STATISTICS_KEYWORDS: &[&str] = &["statistic", "average", "mean"];
const STATISTICS_COLUMN_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub complete_columns: usize,
    pub incomplete_columns: usize,
    /// Column with the most distinct values and that count.
    pub most_diverse: Option<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub column: String,
    pub valid: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

pub fn overview(dataset: &Dataset, profiles: &[ColumnProfile]) -> DatasetOverview {
    let names_of = |column_type: ColumnType| {
        profiles
            .iter()
            .filter(|p| p.column_type == column_type)
            .map(|p| p.name.clone())
            .collect::<Vec<_>>()
    };
    let complete_columns = profiles.iter().filter(|p| p.null_count == 0).count();
    // First column wins ties.
    let most_diverse = profiles
        .iter()
        .fold(None::<&ColumnProfile>, |best, p| match best {
            Some(b) if b.unique_count >= p.unique_count => Some(b),
            _ => Some(p),
        })
        .map(|p| (p.name.clone(), p.unique_count));

    DatasetOverview {
        row_count: dataset.row_count(),
        column_count: dataset.headers().len(),
        numeric_columns: names_of(ColumnType::Number),
        categorical_columns: names_of(ColumnType::String),
        date_columns: names_of(ColumnType::Date),
        complete_columns,
        incomplete_columns: profiles.len() - complete_columns,
        most_diverse,
    }
}

/// Statistics over the strictly numeric values of each numeric column.
pub fn numeric_statistics(profiles: &[ColumnProfile]) -> Vec<NumericSummary> {
    profiles
        .iter()
        .filter(|p| p.column_type == ColumnType::Number)
        .filter_map(|profile| {
            let values = profile
                .values
                .iter()
                .filter_map(|raw| raw.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
                .collect::<Vec<_>>();
            let (min, max) = min_max(&values)?;
            Some(NumericSummary {
                column: profile.name.clone(),
                valid: values.len(),
                mean: mean(&values),
                median: median(&values)?,
                min,
                max,
            })
        })
        .collect()
}

pub fn render_overview(overview: &DatasetOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Data Overview:\n");
    let _ = writeln!(
        out,
        "Dataset: {} rows, {} columns\n",
        overview.row_count, overview.column_count
    );
    let _ = writeln!(out, "Column Types:");
    for (label, names) in [
        ("Numeric", &overview.numeric_columns),
        ("Categorical", &overview.categorical_columns),
        ("Date", &overview.date_columns),
    ] {
        let _ = writeln!(out, "- {label} columns: {} ({})", names.len(), names.join(", "));
    }
    let _ = writeln!(out, "\nData Quality:");
    let _ = writeln!(
        out,
        "- Complete columns: {}/{}",
        overview.complete_columns, overview.column_count
    );
    let _ = writeln!(
        out,
        "- Columns with missing data: {}",
        overview.incomplete_columns
    );
    if let Some((name, unique)) = &overview.most_diverse {
        let _ = writeln!(out, "\nMost diverse column: {name} ({unique} unique values)");
    }
    out
}

pub fn render_statistics(stats: &[NumericSummary], row_count: usize) -> String {
    let mut out = String::from("Statistical Summary:\n");
    for summary in stats {
        let _ = write!(
            out,
            "\n{}:\n- Average: {:.2}\n- Median: {}\n- Range: {} to {}\n- Valid records: {}/{}\n",
            summary.column,
            summary.mean,
            summary.median,
            summary.min,
            summary.max,
            summary.valid,
            row_count
        );
    }
    out
}

/// Routes a free-form question to a canned summary by keyword.
pub fn respond(question: &str, dataset: &Dataset, profiles: &[ColumnProfile]) -> String {
    let lowered = question.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if mentions(OVERVIEW_KEYWORDS) {
        return render_overview(&overview(dataset, profiles));
    }
    if mentions(STATISTICS_KEYWORDS) {
        let stats = numeric_statistics(profiles);
        if stats.is_empty() {
            let available = profiles
                .iter()
                .map(|p| format!("{} ({})", p.name, p.column_type))
                .join(", ");
            return format!(
                "No numeric columns found for statistical analysis.\n\nAvailable columns: {available}\n"
            );
        }
        let shown = stats
            .into_iter()
            .take(STATISTICS_COLUMN_LIMIT)
            .collect::<Vec<_>>();
        return render_statistics(&shown, dataset.row_count());
    }

    format!(
        "Ask for an \"overview\" or for \"statistics\".\n\nYour dataset has {} rows and {} columns.\nAvailable columns: {}\n",
        dataset.row_count(),
        dataset.headers().len(),
        dataset.headers().join(", ")
    )
}
