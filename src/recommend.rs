//! Rule-based chart recommendations derived from column profiles.
//!
//! Recommendations come from an ordered table of independent rules. Every
//! rule whose condition holds contributes its descriptors, in table order, so
//! the output for a given input is always the same sequence with the same
//! ids. When nothing fires a single basic descriptor is emitted as long as a
//! categorical or numeric column is available.

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::RecommendOptions,
    dataset::Dataset,
    schema::{ColumnProfile, ColumnType},
};

const REVENUE_KEYWORDS: &[&str] = &["revenue", "sales", "amount", "price", "cost", "value"];
const FINANCIAL_KEYWORDS: &[&str] = &["open", "close", "high", "low", "volume", "price"];
const PERFORMANCE_KEYWORDS: &[&str] = &[
    "performance",
    "score",
    "rating",
    "salary",
    "income",
    "grade",
];
const COUNT_METRIC: &str = "count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Donut,
    Area,
    Scatter,
    Radar,
    Funnel,
    Treemap,
    Heatmap,
    Waterfall,
    Gauge,
    Bubble,
    Candlestick,
    Violin,
}

impl ChartType {
    pub const ALL: [ChartType; 15] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Donut,
        ChartType::Area,
        ChartType::Scatter,
        ChartType::Radar,
        ChartType::Funnel,
        ChartType::Treemap,
        ChartType::Heatmap,
        ChartType::Waterfall,
        ChartType::Gauge,
        ChartType::Bubble,
        ChartType::Candlestick,
        ChartType::Violin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
            ChartType::Radar => "radar",
            ChartType::Funnel => "funnel",
            ChartType::Treemap => "treemap",
            ChartType::Heatmap => "heatmap",
            ChartType::Waterfall => "waterfall",
            ChartType::Gauge => "gauge",
            ChartType::Bubble => "bubble",
            ChartType::Candlestick => "candlestick",
            ChartType::Violin => "violin",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        ChartType::ALL
            .into_iter()
            .find(|chart| chart.as_str() == lowered)
            .ok_or_else(|| anyhow!("Unknown chart type '{value}'"))
    }
}

/// A recommended chart before any data is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightDescriptor {
    pub id: String,
    pub title: String,
    pub description: String,
    pub chart_type: ChartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, serde_json::Value>>,
}

impl InsightDescriptor {
    pub fn new(
        id: &str,
        chart_type: ChartType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.into(),
            description: description.into(),
            chart_type,
            x_axis: None,
            y_axis: None,
            group_by: None,
            metrics: Vec::new(),
            filters: None,
        }
    }

    pub fn x_axis(mut self, column: &str) -> Self {
        self.x_axis = Some(column.to_string());
        self
    }

    pub fn y_axis(mut self, column: &str) -> Self {
        self.y_axis = Some(column.to_string());
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.metrics = metrics.into_iter().map(|m| m.as_ref().to_string()).collect();
        self
    }
}

/// Columns partitioned by the role they can play in a chart.
#[derive(Debug, Clone)]
pub struct ColumnGroups<'a> {
    pub numeric: Vec<&'a ColumnProfile>,
    pub categorical: Vec<&'a ColumnProfile>,
    pub dates: Vec<&'a ColumnProfile>,
    pub column_count: usize,
    pub options: &'a RecommendOptions,
}

impl<'a> ColumnGroups<'a> {
    pub fn partition(
        profiles: &'a [ColumnProfile],
        row_count: usize,
        options: &'a RecommendOptions,
    ) -> Self {
        let category_limit =
            (options.max_categories as f64).min(row_count as f64 * options.max_category_ratio);
        let of_type = |column_type: ColumnType| {
            profiles
                .iter()
                .filter(move |p| p.column_type == column_type && p.has_values())
        };
        Self {
            numeric: of_type(ColumnType::Number).collect(),
            categorical: of_type(ColumnType::String)
                .filter(|p| p.unique_count > 1 && p.unique_count as f64 <= category_limit)
                .collect(),
            dates: of_type(ColumnType::Date).collect(),
            column_count: profiles.len(),
            options,
        }
    }

    fn first_numeric_matching(&self, keywords: &'static [&'static str]) -> Option<&'a ColumnProfile> {
        self.numeric_matching(keywords).next()
    }

    fn numeric_matching(
        &self,
        keywords: &'static [&'static str],
    ) -> impl Iterator<Item = &'a ColumnProfile> + '_ {
        self.numeric
            .iter()
            .copied()
            .filter(move |p| name_contains_any(&p.name, keywords))
    }
}

fn name_contains_any(name: &str, keywords: &[&str]) -> bool {
    let lowered = name.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

type Rule = fn(&ColumnGroups<'_>) -> Vec<InsightDescriptor>;

const RULES: &[(&str, Rule)] = &[
    ("revenue", revenue_rule),
    ("category", category_rule),
    ("trend", trend_rule),
    ("numeric-by-category", numeric_by_category_rule),
    ("radar", radar_rule),
    ("correlation", correlation_rule),
    ("candlestick", candlestick_rule),
    ("performance", performance_rule),
];

pub fn recommend_insights(dataset: &Dataset, profiles: &[ColumnProfile]) -> Vec<InsightDescriptor> {
    recommend_insights_with(dataset, profiles, &RecommendOptions::default())
}

pub fn recommend_insights_with(
    dataset: &Dataset,
    profiles: &[ColumnProfile],
    options: &RecommendOptions,
) -> Vec<InsightDescriptor> {
    let groups = ColumnGroups::partition(profiles, dataset.row_count(), options);
    debug!(
        "Recommending from {} numeric, {} categorical, {} date column(s)",
        groups.numeric.len(),
        groups.categorical.len(),
        groups.dates.len()
    );

    let mut insights = Vec::new();
    for (name, rule) in RULES {
        let produced = rule(&groups);
        if !produced.is_empty() {
            debug!("Rule '{name}' produced {} insight(s)", produced.len());
        }
        insights.extend(produced);
    }
    if insights.is_empty() {
        insights.extend(fallback_rule(&groups));
    }
    insights
}

fn revenue_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let (Some(revenue), Some(category)) = (
        groups.first_numeric_matching(REVENUE_KEYWORDS),
        groups.categorical.first(),
    ) else {
        return Vec::new();
    };
    let (metric, cat) = (revenue.name.as_str(), category.name.as_str());
    vec![
        InsightDescriptor::new(
            "revenue-by-category",
            ChartType::Bar,
            format!("{metric} by {cat}"),
            format!("Analyze {metric} distribution across different {cat}"),
        )
        .x_axis(cat)
        .y_axis(metric)
        .metrics([metric]),
        InsightDescriptor::new(
            "revenue-donut",
            ChartType::Donut,
            format!("{metric} Distribution (Donut)"),
            format!("Donut chart showing {metric} by {cat}"),
        )
        .group_by(cat)
        .metrics([metric]),
        InsightDescriptor::new(
            "revenue-gauge",
            ChartType::Gauge,
            format!("{metric} Performance Gauge"),
            format!("Gauge chart showing {metric} performance indicator"),
        )
        .metrics([metric]),
    ]
}

fn category_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let Some(category) = groups.categorical.first() else {
        return Vec::new();
    };
    let cat = category.name.as_str();
    vec![
        InsightDescriptor::new(
            "category-breakdown",
            ChartType::Pie,
            format!("{cat} Distribution"),
            format!("Breakdown of records by {cat}"),
        )
        .group_by(cat)
        .metrics([COUNT_METRIC]),
        InsightDescriptor::new(
            "category-treemap",
            ChartType::Treemap,
            format!("{cat} Treemap"),
            format!("Hierarchical view of {cat} distribution"),
        )
        .group_by(cat)
        .metrics([COUNT_METRIC]),
        InsightDescriptor::new(
            "category-heatmap",
            ChartType::Heatmap,
            format!("{cat} Heatmap"),
            format!("Intensity heatmap of {cat} data"),
        )
        .group_by(cat)
        .metrics([COUNT_METRIC]),
    ]
}

fn trend_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let (Some(date), Some(numeric)) = (groups.dates.first(), groups.numeric.first()) else {
        return Vec::new();
    };
    let (when, metric) = (date.name.as_str(), numeric.name.as_str());
    let over_time = |id: &str, chart_type: ChartType, title: String, description: String| {
        InsightDescriptor::new(id, chart_type, title, description)
            .x_axis(when)
            .y_axis(metric)
            .metrics([metric])
    };
    vec![
        over_time(
            "trend-analysis",
            ChartType::Line,
            format!("{metric} Trend Over Time"),
            format!("Track {metric} changes over {when}"),
        ),
        over_time(
            "trend-area",
            ChartType::Area,
            format!("{metric} Area Trend"),
            format!("Filled area chart showing {metric} over time"),
        ),
        over_time(
            "trend-waterfall",
            ChartType::Waterfall,
            format!("{metric} Waterfall Analysis"),
            format!("Waterfall chart showing cumulative changes in {metric}"),
        ),
    ]
}

fn numeric_by_category_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let (Some(numeric), Some(category)) = (groups.numeric.first(), groups.categorical.first())
    else {
        return Vec::new();
    };
    let (metric, cat) = (numeric.name.as_str(), category.name.as_str());
    let mut insights = vec![
        InsightDescriptor::new(
            "numeric-by-category",
            ChartType::Bar,
            format!("Average {metric} by {cat}"),
            format!("Compare average {metric} across different {cat}"),
        )
        .x_axis(cat)
        .y_axis(metric)
        .metrics([metric]),
    ];
    if category.unique_count <= groups.options.funnel_max_categories {
        insights.push(
            InsightDescriptor::new(
                "category-funnel",
                ChartType::Funnel,
                format!("{cat} Funnel Analysis"),
                format!("Funnel view of {cat} progression"),
            )
            .group_by(cat)
            .metrics([COUNT_METRIC]),
        );
    }
    insights.push(
        InsightDescriptor::new(
            "distribution-violin",
            ChartType::Violin,
            format!("{metric} Distribution Shape"),
            format!("Violin plot showing {metric} distribution by {cat}"),
        )
        .x_axis(cat)
        .y_axis(metric)
        .metrics([metric]),
    );
    insights
}

fn radar_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let Some(category) = groups.categorical.first() else {
        return Vec::new();
    };
    if groups.numeric.len() < 3 {
        return Vec::new();
    }
    let metrics = groups
        .numeric
        .iter()
        .take(groups.options.radar_max_metrics)
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>();
    vec![
        InsightDescriptor::new(
            "multi-metric-radar",
            ChartType::Radar,
            "Multi-Metric Radar",
            format!("Radar chart comparing {}", metrics.iter().join(", ")),
        )
        .x_axis(&category.name)
        .metrics(&metrics),
    ]
}

fn correlation_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let [first, second, rest @ ..] = groups.numeric.as_slice() else {
        return Vec::new();
    };
    let (x, y) = (first.name.as_str(), second.name.as_str());
    let mut insights = vec![
        InsightDescriptor::new(
            "distribution-analysis",
            ChartType::Scatter,
            format!("{x} vs {y}"),
            format!("Explore the relationship between {x} and {y}"),
        )
        .x_axis(x)
        .y_axis(y)
        .metrics([x, y]),
    ];
    if let Some(third) = rest.first() {
        let z = third.name.as_str();
        insights.push(
            InsightDescriptor::new(
                "bubble-analysis",
                ChartType::Bubble,
                format!("{x} vs {y} (Bubble)"),
                format!("Bubble chart with {z} as size"),
            )
            .x_axis(x)
            .y_axis(y)
            .metrics([x, y, z]),
        );
    }
    insights
}

/// Metrics are taken positionally as open, high, low, close; names are not
/// matched to roles.
fn candlestick_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let financial = groups
        .numeric_matching(FINANCIAL_KEYWORDS)
        .take(4)
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>();
    if financial.len() < 4 {
        return Vec::new();
    }
    vec![
        InsightDescriptor::new(
            "financial-candlestick",
            ChartType::Candlestick,
            "Financial Candlestick Chart",
            "Candlestick chart for financial data analysis",
        )
        .metrics(&financial),
    ]
}

fn performance_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    let (Some(performance), Some(category)) = (
        groups.first_numeric_matching(PERFORMANCE_KEYWORDS),
        groups.categorical.first(),
    ) else {
        return Vec::new();
    };
    let (metric, cat) = (performance.name.as_str(), category.name.as_str());
    vec![
        InsightDescriptor::new(
            "performance-comparison",
            ChartType::Bar,
            format!("{metric} Analysis"),
            format!("Analyze {metric} across different {cat}"),
        )
        .x_axis(cat)
        .y_axis(metric)
        .metrics([metric]),
    ]
}

fn fallback_rule(groups: &ColumnGroups<'_>) -> Vec<InsightDescriptor> {
    if groups.column_count == 0 {
        return Vec::new();
    }
    if let Some(category) = groups.categorical.first() {
        let cat = category.name.as_str();
        return vec![
            InsightDescriptor::new(
                "basic-distribution",
                ChartType::Pie,
                format!("{cat} Overview"),
                format!("Basic distribution of {cat}"),
            )
            .group_by(cat)
            .metrics([COUNT_METRIC]),
        ];
    }
    if let Some(numeric) = groups.numeric.first() {
        let metric = numeric.name.as_str();
        return vec![
            InsightDescriptor::new(
                "basic-numeric",
                ChartType::Bar,
                format!("{metric} Analysis"),
                format!("Basic analysis of {metric}"),
            )
            .x_axis("index")
            .y_axis(metric)
            .metrics([metric]),
        ];
    }
    Vec::new()
}
