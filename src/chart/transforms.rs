//! Per-chart-type reshaping of raw rows into chart-ready data.
//!
//! Every transform returns an empty vector when the descriptor lacks the
//! inputs its chart type needs; the caller substitutes a sample payload.
//! Row caps apply after aggregation.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

use super::{
    DataRow, KeyMap,
    aggregate::{
        by_count_desc, count_by, data_row, group_rows, mean, median, min_max, name_value_rows,
        number,
    },
};
use crate::{
    dataset::{Dataset, UNKNOWN_LABEL},
    recommend::InsightDescriptor,
};

const MEAN_GROUP_LIMIT: usize = 20;
const PIE_LIMIT: usize = 10;
const FUNNEL_LIMIT: usize = 8;
const AREA_GROUP_LIMIT: usize = 15;
const SCATTER_LIMIT: usize = 500;
const BUBBLE_LIMIT: usize = 100;
const RADAR_ROWS: usize = 6;
const HEATMAP_ROWS: usize = 100;
const HEATMAP_COLUMNS: usize = 10;
const WATERFALL_ROWS: usize = 15;
const CANDLESTICK_ROWS: usize = 50;
const HEATMAP_SEED: u64 = 0x4ea7_3a90;

fn axes(descriptor: &InsightDescriptor) -> Option<(&str, &str)> {
    Some((descriptor.x_axis.as_deref()?, descriptor.y_axis.as_deref()?))
}

fn raw_or(value: Option<&str>, fallback: impl FnOnce() -> String) -> Value {
    Value::from(value.map(str::to_string).unwrap_or_else(fallback))
}

pub fn mean_by_group(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some((x, y)) = axes(descriptor) else {
        return Vec::new();
    };
    let value = dataset.resolve(y);
    group_rows(dataset, dataset.resolve(x), |row| number(value, row))
        .into_iter()
        .take(MEAN_GROUP_LIMIT)
        .map(|(label, values)| data_row([(x, json!(label)), (y, json!(mean(&values)))]))
        .collect()
}

pub fn mean_keys(descriptor: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: descriptor.x_axis.clone(),
        y_key: descriptor.y_axis.clone(),
        data_key: descriptor.metrics.first().cloned(),
        ..KeyMap::default()
    }
}

pub fn share(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(group) = descriptor.group_by.as_deref() else {
        return Vec::new();
    };
    let counts = by_count_desc(count_by(dataset, dataset.resolve(group)))
        .into_iter()
        .take(PIE_LIMIT)
        .map(|(name, count)| {
            let name = if name.is_empty() {
                UNKNOWN_LABEL.to_string()
            } else {
                name
            };
            (name, count)
        })
        .collect();
    name_value_rows(counts)
}

pub fn funnel(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(group) = descriptor.group_by.as_deref() else {
        return Vec::new();
    };
    let counts = by_count_desc(count_by(dataset, dataset.resolve(group)))
        .into_iter()
        .take(FUNNEL_LIMIT)
        .collect();
    name_value_rows(counts)
}

pub fn treemap(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(group) = descriptor.group_by.as_deref() else {
        return Vec::new();
    };
    count_by(dataset, dataset.resolve(group))
        .into_iter()
        .map(|(name, count)| {
            data_row([
                ("name", json!(name)),
                ("value", json!(count)),
                ("size", json!(count)),
            ])
        })
        .collect()
}

pub fn scatter(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some((x, y)) = axes(descriptor) else {
        return Vec::new();
    };
    let (x, y) = (dataset.resolve(x), dataset.resolve(y));
    dataset
        .rows()
        .iter()
        .map(|row| (number(x, row), number(y, row)))
        .filter(|&(px, py)| px != 0.0 || py != 0.0)
        .take(SCATTER_LIMIT)
        .map(|(px, py)| data_row([("x", json!(px)), ("y", json!(py))]))
        .collect()
}

pub fn bubble(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let [mx, my, mz, ..] = descriptor.metrics.as_slice() else {
        return Vec::new();
    };
    let label = descriptor.x_axis.as_deref().map(|x| dataset.resolve(x));
    let (cx, cy, cz) = (dataset.resolve(mx), dataset.resolve(my), dataset.resolve(mz));
    dataset
        .rows()
        .iter()
        .take(BUBBLE_LIMIT)
        .enumerate()
        .map(|(index, row)| {
            let x = cx.of(row).number_or(index as f64);
            let y = cy.of(row).number_or(0.0);
            let z = cz.of(row).number_or(10.0);
            let name = raw_or(label.and_then(|l| l.of(row).raw()), || {
                format!("Point {}", index + 1)
            });
            data_row([
                ("x".to_string(), json!(x)),
                ("y".to_string(), json!(y)),
                ("z".to_string(), json!(z)),
                ("name".to_string(), name),
                (mx.clone(), json!(x)),
                (my.clone(), json!(y)),
                (mz.clone(), json!(z)),
            ])
        })
        .collect()
}

pub fn radar(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    if descriptor.metrics.is_empty() {
        return Vec::new();
    }
    let subject = descriptor.x_axis.as_deref().map(|x| dataset.resolve(x));
    let metrics = descriptor
        .metrics
        .iter()
        .map(|metric| (metric, dataset.resolve(metric)))
        .collect::<Vec<_>>();
    dataset
        .rows()
        .iter()
        .take(RADAR_ROWS)
        .enumerate()
        .map(|(index, row)| {
            let mut point = DataRow::new();
            point.insert(
                "subject".into(),
                raw_or(subject.and_then(|s| s.of(row).raw()), || {
                    format!("Item {}", index + 1)
                }),
            );
            for (name, column) in &metrics {
                point.insert((*name).clone(), json!(number(*column, row)));
            }
            point
        })
        .collect()
}

/// Cells whose metric is zero or unparseable get a value from a fixed-seed
/// generator, so repeated calls produce identical payloads.
pub fn heatmap(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(group) = descriptor.group_by.as_deref() else {
        return Vec::new();
    };
    let category = dataset.resolve(group);
    let metric = dataset.resolve(descriptor.metrics.first().map_or("", String::as_str));
    let mut rng = StdRng::seed_from_u64(HEATMAP_SEED);
    dataset
        .rows()
        .iter()
        .take(HEATMAP_ROWS)
        .enumerate()
        .map(|(index, row)| {
            let value = match metric.of(row).lenient_number() {
                Some(value) if value != 0.0 => value,
                _ => rng.random_range(0.0..100.0),
            };
            let name = raw_or(category.of(row).raw(), || {
                format!("Category {}", index % HEATMAP_COLUMNS)
            });
            data_row([
                ("id", json!(index)),
                ("value", json!(value)),
                ("category", name),
                ("x", json!(index % HEATMAP_COLUMNS)),
                ("y", json!(index / HEATMAP_COLUMNS)),
            ])
        })
        .collect()
}

/// Mean as a percentage of the maximum. Non-finite ratios yield no data.
pub fn gauge(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(metric) = descriptor.metrics.first() else {
        return Vec::new();
    };
    let column = dataset.resolve(metric);
    let values = dataset
        .rows()
        .iter()
        .map(|row| number(column, row))
        .collect::<Vec<_>>();
    let Some((_, max)) = min_max(&values) else {
        return Vec::new();
    };
    let percentage = mean(&values) / max * 100.0;
    if !percentage.is_finite() {
        return Vec::new();
    }
    vec![data_row([("value", json!(percentage)), ("max", json!(100))])]
}

pub fn waterfall(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some((x, y)) = axes(descriptor) else {
        return Vec::new();
    };
    let (label, value) = (dataset.resolve(x), dataset.resolve(y));
    let mut cumulative = 0.0;
    dataset
        .rows()
        .iter()
        .take(WATERFALL_ROWS)
        .map(|row| {
            let step = number(value, row);
            cumulative += step;
            let mut point = DataRow::new();
            // Rows without a label carry no x key at all.
            if let Some(raw) = label.of(row).raw() {
                point.insert(x.to_string(), Value::from(raw));
            }
            point.insert(y.to_string(), json!(step));
            point.insert("cumulative".into(), json!(cumulative));
            point
        })
        .collect()
}

/// Metrics map positionally to open, high, low, close.
pub fn candlestick(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let [open, high, low, close, ..] = descriptor.metrics.as_slice() else {
        return Vec::new();
    };
    let date = descriptor.x_axis.as_deref().map(|x| dataset.resolve(x));
    let columns = [open, high, low, close].map(|m| dataset.resolve(m));
    dataset
        .rows()
        .iter()
        .take(CANDLESTICK_ROWS)
        .enumerate()
        .map(|(index, row)| {
            let [o, h, l, c] = columns.map(|column| number(column, row));
            data_row([
                (
                    "date",
                    raw_or(date.and_then(|d| d.of(row).raw()), || {
                        format!("Row {}", index + 1)
                    }),
                ),
                ("open", json!(o)),
                ("high", json!(h)),
                ("low", json!(l)),
                ("close", json!(c)),
            ])
        })
        .collect()
}

pub fn violin(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some((x, y)) = axes(descriptor) else {
        return Vec::new();
    };
    let value = dataset.resolve(y);
    group_rows(dataset, dataset.resolve(x), |row| number(value, row))
        .into_iter()
        .map(|(label, values)| {
            let (lo, hi) = min_max(&values).unwrap_or_default();
            data_row([
                (x, json!(label)),
                (y, json!(mean(&values))),
                ("median", json!(median(&values).unwrap_or_default())),
                ("min", json!(lo)),
                ("max", json!(hi)),
            ])
        })
        .collect()
}

pub fn area(dataset: &Dataset, descriptor: &InsightDescriptor) -> Vec<DataRow> {
    let Some(x) = descriptor.x_axis.as_deref() else {
        return Vec::new();
    };
    if descriptor.metrics.is_empty() {
        return Vec::new();
    }
    let metrics = descriptor
        .metrics
        .iter()
        .map(|metric| dataset.resolve(metric))
        .collect::<Vec<_>>();
    group_rows(dataset, dataset.resolve(x), |row| {
        metrics
            .iter()
            .map(|column| number(*column, row))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .take(AREA_GROUP_LIMIT)
    .map(|(label, samples)| {
        let mut point = DataRow::new();
        point.insert(x.to_string(), json!(label));
        for (slot, name) in descriptor.metrics.iter().enumerate() {
            let series = samples.iter().map(|sample| sample[slot]).collect::<Vec<_>>();
            point.insert(name.clone(), json!(mean(&series)));
        }
        point
    })
    .collect()
}

pub fn name_value_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap::name_value()
}

pub fn point_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: Some("x".into()),
        y_key: Some("y".into()),
        ..KeyMap::default()
    }
}

pub fn bubble_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: Some("x".into()),
        y_key: Some("y".into()),
        data_key: Some("z".into()),
        name_key: Some("name".into()),
        ..KeyMap::default()
    }
}

pub fn radar_keys(descriptor: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: Some("subject".into()),
        data_key: descriptor.metrics.first().cloned(),
        ..KeyMap::default()
    }
}

pub fn heatmap_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: Some("x".into()),
        y_key: Some("y".into()),
        name_key: Some("category".into()),
        value_key: Some("value".into()),
        ..KeyMap::default()
    }
}

pub fn gauge_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap {
        value_key: Some("value".into()),
        ..KeyMap::default()
    }
}

pub fn waterfall_keys(descriptor: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: descriptor.x_axis.clone(),
        y_key: descriptor.y_axis.clone(),
        data_key: Some("cumulative".into()),
        ..KeyMap::default()
    }
}

pub fn candlestick_keys(_: &InsightDescriptor) -> KeyMap {
    KeyMap {
        x_key: Some("date".into()),
        data_key: Some("close".into()),
        ..KeyMap::default()
    }
}
