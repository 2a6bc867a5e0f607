//! Fixed placeholder payloads returned when a descriptor cannot be
//! materialized from the dataset.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

use super::{DataRow, KeyMap, aggregate::data_row};
use crate::recommend::ChartType;

pub const SAMPLE_SEED: u64 = 0x5eed_c5a7;

const RADAR_SUBJECTS: &[(&str, u32, u32)] = &[
    ("Math", 120, 110),
    ("Chinese", 98, 130),
    ("English", 86, 130),
    ("Geography", 99, 100),
    ("Physics", 85, 90),
    ("History", 65, 85),
];

pub fn sample_for(chart_type: ChartType) -> (Vec<DataRow>, KeyMap) {
    match chart_type {
        ChartType::Radar => radar(),
        ChartType::Bubble => bubble(),
        ChartType::Heatmap => heatmap(),
        ChartType::Gauge => gauge(),
        _ => categories(),
    }
}

fn radar() -> (Vec<DataRow>, KeyMap) {
    let data = RADAR_SUBJECTS
        .iter()
        .map(|(subject, a, b)| {
            data_row([
                ("subject", json!(subject)),
                ("A", json!(a)),
                ("B", json!(b)),
                ("fullMark", json!(150)),
            ])
        })
        .collect();
    let keys = KeyMap {
        x_key: Some("subject".into()),
        data_key: Some("A".into()),
        ..KeyMap::default()
    };
    (data, keys)
}

fn bubble() -> (Vec<DataRow>, KeyMap) {
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let data = (0..20)
        .map(|i| {
            data_row([
                ("x", json!(rng.random_range(0.0..100.0))),
                ("y", json!(rng.random_range(0.0..100.0))),
                ("z", json!(rng.random_range(10.0..60.0))),
                ("name", json!(format!("Point {}", i + 1))),
            ])
        })
        .collect();
    let keys = KeyMap {
        x_key: Some("x".into()),
        y_key: Some("y".into()),
        data_key: Some("z".into()),
        name_key: Some("name".into()),
        ..KeyMap::default()
    };
    (data, keys)
}

fn heatmap() -> (Vec<DataRow>, KeyMap) {
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let data = (0..50usize)
        .map(|i| {
            data_row([
                ("id", json!(i)),
                ("value", json!(rng.random_range(0.0..100.0))),
                ("x", json!(i % 10)),
                ("y", json!(i / 10)),
            ])
        })
        .collect();
    let keys = KeyMap {
        x_key: Some("x".into()),
        y_key: Some("y".into()),
        value_key: Some("value".into()),
        ..KeyMap::default()
    };
    (data, keys)
}

fn gauge() -> (Vec<DataRow>, KeyMap) {
    let data = vec![data_row([("value", json!(75)), ("max", json!(100))])];
    let keys = KeyMap {
        value_key: Some("value".into()),
        ..KeyMap::default()
    };
    (data, keys)
}

fn categories() -> (Vec<DataRow>, KeyMap) {
    let data = [("Sample A", 30), ("Sample B", 45), ("Sample C", 25)]
        .into_iter()
        .map(|(name, value)| data_row([("name", Value::from(name)), ("value", json!(value))]))
        .collect();
    (data, KeyMap::name_value())
}
