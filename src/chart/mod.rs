//! Materializes insight descriptors into chart-ready payloads.
//!
//! Dispatch goes through a registry keyed by [`ChartType`]: each entry pairs
//! a transform with the key map describing its output. A transform that
//! yields no rows is replaced by the chart type's sample payload, so callers
//! always receive displayable data. Transforms share no state; each call is a
//! pure function of the dataset and one descriptor.

pub mod aggregate;
pub mod samples;
pub mod transforms;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    dataset::Dataset,
    recommend::{ChartType, InsightDescriptor},
};

/// One row of chart data; keys depend on the chart type.
pub type DataRow = Map<String, Value>;

/// Which keys of a payload's rows feed each chart role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_key: Option<String>,
}

impl KeyMap {
    pub fn name_value() -> Self {
        Self {
            name_key: Some("name".into()),
            value_key: Some("value".into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: Vec<DataRow>,
    pub key_map: KeyMap,
    /// Set when `data` is the placeholder sample rather than dataset rows.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sample: bool,
}

type TransformFn = fn(&Dataset, &InsightDescriptor) -> Vec<DataRow>;
type KeysFn = fn(&InsightDescriptor) -> KeyMap;

#[derive(Clone, Copy)]
pub struct ChartHandler {
    pub transform: TransformFn,
    pub keys: KeysFn,
}

pub fn handler_for(chart_type: ChartType) -> ChartHandler {
    use transforms as t;
    let (transform, keys): (TransformFn, KeysFn) = match chart_type {
        ChartType::Bar | ChartType::Line => (t::mean_by_group, t::mean_keys),
        ChartType::Pie | ChartType::Donut => (t::share, t::name_value_keys),
        ChartType::Funnel => (t::funnel, t::name_value_keys),
        ChartType::Treemap => (t::treemap, t::name_value_keys),
        ChartType::Scatter => (t::scatter, t::point_keys),
        ChartType::Bubble => (t::bubble, t::bubble_keys),
        ChartType::Radar => (t::radar, t::radar_keys),
        ChartType::Heatmap => (t::heatmap, t::heatmap_keys),
        ChartType::Gauge => (t::gauge, t::gauge_keys),
        ChartType::Waterfall => (t::waterfall, t::waterfall_keys),
        ChartType::Candlestick => (t::candlestick, t::candlestick_keys),
        ChartType::Violin => (t::violin, t::mean_keys),
        ChartType::Area => (t::area, t::mean_keys),
    };
    ChartHandler { transform, keys }
}

pub fn transform_for_chart(dataset: &Dataset, descriptor: &InsightDescriptor) -> ChartPayload {
    let handler = handler_for(descriptor.chart_type);
    let data = (handler.transform)(dataset, descriptor);
    let (data, key_map, sample) = if data.is_empty() {
        warn!(
            "Insight '{}' ({}) produced no data; using sample payload",
            descriptor.id, descriptor.chart_type
        );
        let (data, keys) = samples::sample_for(descriptor.chart_type);
        (data, keys, true)
    } else {
        debug!(
            "Insight '{}' ({}) produced {} data row(s)",
            descriptor.id,
            descriptor.chart_type,
            data.len()
        );
        (data, (handler.keys)(descriptor), false)
    };

    ChartPayload {
        id: descriptor.id.clone(),
        title: descriptor.title.clone(),
        chart_type: descriptor.chart_type,
        data,
        key_map,
        sample,
    }
}

/// Transforms each descriptor independently, preserving input order.
pub fn transform_all<'a, I>(dataset: &Dataset, descriptors: I) -> Vec<ChartPayload>
where
    I: IntoIterator<Item = &'a InsightDescriptor>,
{
    descriptors
        .into_iter()
        .map(|descriptor| transform_for_chart(dataset, descriptor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|row| row.to_vec()),
        )
        .expect("dataset")
    }

    fn regional() -> Dataset {
        dataset(
            &["region", "sales"],
            &[&["East", "10"], &["East", "20"], &["West", "5"]],
        )
    }

    fn descriptor(chart_type: ChartType) -> InsightDescriptor {
        InsightDescriptor::new("t", chart_type, "Test", "test")
    }

    #[test]
    fn bar_averages_per_group() {
        let desc = descriptor(ChartType::Bar).x_axis("region").y_axis("sales");
        let payload = transform_for_chart(&regional(), &desc);
        assert!(!payload.sample);
        assert_eq!(
            serde_json::to_value(&payload.data).unwrap(),
            json!([{"region": "East", "sales": 15.0}, {"region": "West", "sales": 5.0}])
        );
        assert_eq!(payload.key_map.x_key.as_deref(), Some("region"));
    }

    #[test]
    fn bar_caps_at_twenty_groups() {
        let labels = (0..30).map(|i| format!("g{i}")).collect::<Vec<_>>();
        let rows = labels
            .iter()
            .map(|label| vec![label.as_str(), "1"])
            .collect::<Vec<_>>();
        let data = Dataset::new(vec!["g".into(), "v".into()], rows).unwrap();
        let desc = descriptor(ChartType::Line).x_axis("g").y_axis("v");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 20);
        assert_eq!(payload.data[0]["g"], json!("g0"));
    }

    #[test]
    fn missing_axes_fall_back_to_sample() {
        let payload = transform_for_chart(&regional(), &descriptor(ChartType::Bar));
        assert!(payload.sample);
        assert_eq!(payload.data.len(), 3);
        assert_eq!(payload.key_map, KeyMap::name_value());
    }

    #[test]
    fn candlestick_with_two_metrics_uses_sample() {
        let desc = descriptor(ChartType::Candlestick).metrics(["sales", "region"]);
        let payload = transform_for_chart(&regional(), &desc);
        assert!(payload.sample);
        assert_eq!(payload.data[0]["name"], json!("Sample A"));
    }

    #[test]
    fn pie_sorts_by_count() {
        let desc = descriptor(ChartType::Pie).group_by("region");
        let payload = transform_for_chart(&regional(), &desc);
        assert_eq!(
            serde_json::to_value(&payload.data).unwrap(),
            json!([{"name": "East", "value": 2}, {"name": "West", "value": 1}])
        );
    }

    #[test]
    fn gauge_reports_mean_over_max() {
        let desc = descriptor(ChartType::Gauge).metrics(["sales"]);
        let payload = transform_for_chart(&regional(), &desc);
        let value = payload.data[0]["value"].as_f64().unwrap();
        assert!((value - 58.333_333).abs() < 1e-4);
    }

    #[test]
    fn gauge_over_zero_column_uses_sample() {
        let data = dataset(&["v"], &[&["0"], &["0"]]);
        let payload = transform_for_chart(&data, &descriptor(ChartType::Gauge).metrics(["v"]));
        assert!(payload.sample);
        assert_eq!(payload.data[0]["value"], json!(75));
    }

    #[test]
    fn scatter_drops_origin_points() {
        let data = dataset(&["a", "b"], &[&["0", "0"], &["1", "x"], &["", "2"]]);
        let desc = descriptor(ChartType::Scatter).x_axis("a").y_axis("b");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(
            serde_json::to_value(&payload.data).unwrap(),
            json!([{"x": 1.0, "y": 0.0}, {"x": 0.0, "y": 2.0}])
        );
    }

    #[test]
    fn waterfall_accumulates() {
        let desc = descriptor(ChartType::Waterfall).x_axis("region").y_axis("sales");
        let payload = transform_for_chart(&regional(), &desc);
        let totals = payload
            .data
            .iter()
            .map(|row| row["cumulative"].as_f64().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(totals, vec![10.0, 30.0, 35.0]);
    }

    #[test]
    fn violin_reports_upper_median() {
        let data = dataset(
            &["k", "v"],
            &[&["a", "4"], &["a", "1"], &["a", "3"], &["a", "2"], &["b", "9"]],
        );
        let desc = descriptor(ChartType::Violin).x_axis("k").y_axis("v");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data[0]["median"], json!(3.0));
        assert_eq!(payload.data[0]["min"], json!(1.0));
        assert_eq!(payload.data[0]["max"], json!(4.0));
        assert_eq!(payload.data[0]["v"], json!(2.5));
    }

    #[test]
    fn bubble_defaults_zero_values() {
        let data = dataset(&["a", "b", "c"], &[&["0", "", "0"], &["5", "6", "7"]]);
        let desc = descriptor(ChartType::Bubble).metrics(["a", "b", "c"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data[0]["x"], json!(0.0));
        assert_eq!(payload.data[0]["z"], json!(10.0));
        assert_eq!(payload.data[1]["x"], json!(5.0));
        assert_eq!(payload.data[0]["name"], json!("Point 1"));
    }

    #[test]
    fn heatmap_is_deterministic() {
        let desc = descriptor(ChartType::Heatmap)
            .group_by("region")
            .metrics(["count"]);
        let first = transform_for_chart(&regional(), &desc);
        let second = transform_for_chart(&regional(), &desc);
        assert_eq!(first, second);
        assert_eq!(first.data[2]["y"], json!(0));
        assert_eq!(first.data[2]["category"], json!("West"));
    }

    #[test]
    fn area_averages_each_metric() {
        let data = dataset(
            &["day", "a", "b"],
            &[&["d1", "1", "10"], &["d1", "3", "20"], &["d2", "5", "x"]],
        );
        let desc = descriptor(ChartType::Area).x_axis("day").metrics(["a", "b"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(
            serde_json::to_value(&payload.data).unwrap(),
            json!([{"day": "d1", "a": 2.0, "b": 15.0}, {"day": "d2", "a": 5.0, "b": 0.0}])
        );
    }

    #[test]
    fn radar_takes_first_six_rows() {
        let rows = (0..8).map(|i| vec![format!("s{i}"), format!("{i}")]).collect::<Vec<_>>();
        let data = Dataset::new(vec!["name".into(), "m".into()], rows).unwrap();
        let desc = descriptor(ChartType::Radar).x_axis("name").metrics(["m"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 6);
        assert_eq!(payload.data[5]["subject"], json!("s5"));
    }

    fn generated(headers: &[&str], count: usize, row: impl Fn(usize) -> Vec<String>) -> Dataset {
        Dataset::new(headers.iter().map(|h| h.to_string()).collect(), (0..count).map(row))
            .expect("dataset")
    }

    #[test]
    fn scatter_caps_after_dropping_origin_points() {
        let data = generated(&["a", "b"], 610, |i| {
            if i < 10 {
                vec!["0".into(), "0".into()]
            } else {
                vec![format!("{}", i - 9), "1".into()]
            }
        });
        let desc = descriptor(ChartType::Scatter).x_axis("a").y_axis("b");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 500);
        assert_eq!(payload.data[0]["x"], json!(1.0));
        assert_eq!(payload.data[499]["x"], json!(500.0));
    }

    #[test]
    fn bubble_caps_at_one_hundred_rows() {
        let data = generated(&["a", "b", "c"], 150, |i| {
            vec![format!("{}", i + 1), "2".into(), "3".into()]
        });
        let desc = descriptor(ChartType::Bubble).metrics(["a", "b", "c"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 100);
        assert_eq!(payload.data[99]["x"], json!(100.0));
    }

    #[test]
    fn heatmap_caps_at_one_hundred_cells() {
        let data = generated(&["k", "v"], 150, |i| vec![format!("k{i}"), "5".into()]);
        let desc = descriptor(ChartType::Heatmap).group_by("k").metrics(["v"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 100);
        let last = &payload.data[99];
        assert_eq!(last["x"], json!(9));
        assert_eq!(last["y"], json!(9));
        assert_eq!(last["value"], json!(5.0));
    }

    #[test]
    fn waterfall_caps_at_fifteen_steps() {
        let data = generated(&["k", "v"], 20, |i| vec![format!("s{i}"), format!("{}", i + 1)]);
        let desc = descriptor(ChartType::Waterfall).x_axis("k").y_axis("v");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 15);
        assert_eq!(payload.data[14]["cumulative"], json!(120.0));
        assert_eq!(payload.data[14]["k"], json!("s14"));
    }

    #[test]
    fn waterfall_omits_missing_labels() {
        let data = dataset(&["k", "v"], &[&["", "4"], &["a", "1"]]);
        let desc = descriptor(ChartType::Waterfall).x_axis("k").y_axis("v");
        let payload = transform_for_chart(&data, &desc);
        assert!(!payload.data[0].contains_key("k"));
        assert_eq!(payload.data[0]["cumulative"], json!(4.0));
        assert_eq!(payload.data[1]["k"], json!("a"));
    }

    #[test]
    fn candlestick_caps_at_fifty_rows() {
        let data = generated(&["o", "h", "l", "c"], 60, |i| {
            (0..4).map(|offset| format!("{}", i + offset)).collect()
        });
        let desc = descriptor(ChartType::Candlestick).metrics(["o", "h", "l", "c"]);
        let payload = transform_for_chart(&data, &desc);
        assert!(!payload.sample);
        assert_eq!(payload.data.len(), 50);
        assert_eq!(payload.data[49]["date"], json!("Row 50"));
        assert_eq!(payload.data[49]["close"], json!(52.0));
    }

    #[test]
    fn area_caps_at_fifteen_groups() {
        let data = generated(&["day", "a"], 20, |i| vec![format!("d{i}"), "1".into()]);
        let desc = descriptor(ChartType::Area).x_axis("day").metrics(["a"]);
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 15);
        assert_eq!(payload.data[14]["day"], json!("d14"));
    }

    #[test]
    fn treemap_keeps_every_category() {
        let data = generated(&["k"], 40, |i| vec![format!("k{i}")]);
        let desc = descriptor(ChartType::Treemap).group_by("k");
        let payload = transform_for_chart(&data, &desc);
        assert_eq!(payload.data.len(), 40);
        assert_eq!(payload.data[39]["size"], json!(1));
    }

    #[test]
    fn every_chart_type_has_a_handler() {
        let data = Dataset::default();
        for chart_type in ChartType::ALL {
            let payload = transform_for_chart(&data, &descriptor(chart_type));
            assert!(!payload.data.is_empty(), "{chart_type} produced no data");
            assert_eq!(payload.chart_type, chart_type);
        }
    }
}
