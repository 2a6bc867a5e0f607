use indexmap::IndexMap;
use serde_json::Value;

use crate::dataset::{ColumnRef, Dataset, Row};

use super::DataRow;

/// Groups rows by the trimmed label of `key`, extracting one value per row.
/// Keys keep first-seen order.
pub fn group_rows<T, F>(
    dataset: &Dataset,
    key: ColumnRef,
    mut extract: F,
) -> IndexMap<String, Vec<T>>
where
    F: FnMut(&Row) -> T,
{
    let mut groups: IndexMap<String, Vec<T>> = IndexMap::new();
    for row in dataset.rows() {
        groups
            .entry(key.of(row).label())
            .or_default()
            .push(extract(row));
    }
    groups
}

/// Occurrence counts per label of `key`, in first-seen order.
pub fn count_by(dataset: &Dataset, key: ColumnRef) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for row in dataset.rows() {
        *counts.entry(key.of(row).label()).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

/// Stable sort by descending count; ties keep first-seen order.
pub fn by_count_desc(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Upper median: the element at `len / 2` of the ascending-sorted values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.get(sorted.len() / 2).copied()
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &value| match acc {
        None => Some((value, value)),
        Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
    })
}

/// Lenient number with the zero default used throughout aggregation.
pub fn number(key: ColumnRef, row: &Row) -> f64 {
    key.of(row).lenient_number().unwrap_or(0.0)
}

pub fn data_row<I, K>(entries: I) -> DataRow
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}

pub fn name_value_rows(counts: Vec<(String, usize)>) -> Vec<DataRow> {
    counts
        .into_iter()
        .map(|(name, value)| data_row([("name", Value::from(name)), ("value", Value::from(value))]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(rows: &[[&str; 2]]) -> Dataset {
        Dataset::new(vec!["label".into(), "value".into()], rows.iter().copied()).expect("dataset")
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let data = labelled(&[["b", "1"], [" a ", "2"], ["b", "3"], ["", "4"]]);
        let value = data.resolve("value");
        let groups = group_rows(&data, data.resolve("label"), |row| number(value, row));
        let entries = groups.into_iter().collect::<Vec<_>>();
        assert_eq!(
            entries,
            vec![
                ("b".to_string(), vec![1.0, 3.0]),
                ("a".to_string(), vec![2.0]),
                ("Unknown".to_string(), vec![4.0]),
            ]
        );
    }

    #[test]
    fn counts_follow_first_seen_order() {
        let data = labelled(&[["y", "1"], ["x", "1"], ["y", "1"]]);
        assert_eq!(
            count_by(&data, data.resolve("label")),
            vec![("y".to_string(), 2), ("x".to_string(), 1)]
        );
    }

    #[test]
    fn count_sort_is_stable() {
        let counts = vec![
            ("x".to_string(), 1),
            ("y".to_string(), 3),
            ("z".to_string(), 1),
        ];
        let sorted = by_count_desc(counts);
        let names = sorted.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["y", "x", "z"]);
    }

    #[test]
    fn summary_helpers() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(3.0));
        assert_eq!(median(&[]), None);
        assert_eq!(min_max(&[2.0, -1.0, 5.0]), Some((-1.0, 5.0)));
    }
}
