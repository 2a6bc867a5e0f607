//! Tunable thresholds for inference and recommendation, persisted as YAML.
//!
//! Every field has a default so a config file only needs the keys it
//! overrides.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceOptions {
    /// Share of present values that must parse as numbers (strictly greater).
    pub numeric_ratio: f64,
    /// Share of present values that must parse as calendar dates (strictly greater).
    pub date_ratio: f64,
    pub min_date_length: usize,
    /// Exclusive lower year bound for a date candidate.
    pub min_year: i32,
    /// Exclusive upper year bound for a date candidate.
    pub max_year: i32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            numeric_ratio: 0.7,
            date_ratio: 0.5,
            min_date_length: 4,
            min_year: 1900,
            max_year: 2100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendOptions {
    /// Upper bound on distinct values for a categorical column.
    pub max_categories: usize,
    /// Categorical columns may not exceed this share of the row count in distinct values.
    pub max_category_ratio: f64,
    /// Funnel charts are only suggested at or below this many categories.
    pub funnel_max_categories: usize,
    pub radar_max_metrics: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            max_categories: 50,
            max_category_ratio: 0.8,
            funnel_max_categories: 8,
            radar_max_metrics: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightConfig {
    pub inference: InferenceOptions,
    pub recommend: RecommendOptions,
}

impl InsightConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        let config: Self =
            serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing config")?;
        let mut file =
            File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        file.write_all(serialized.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let inference = &self.inference;
        ensure!(
            (0.0..=1.0).contains(&inference.numeric_ratio),
            "inference.numeric_ratio must be between 0 and 1"
        );
        ensure!(
            (0.0..=1.0).contains(&inference.date_ratio),
            "inference.date_ratio must be between 0 and 1"
        );
        ensure!(
            inference.min_year < inference.max_year,
            "inference.min_year ({}) must be below inference.max_year ({})",
            inference.min_year,
            inference.max_year
        );
        let recommend = &self.recommend;
        ensure!(
            (0.0..=1.0).contains(&recommend.max_category_ratio),
            "recommend.max_category_ratio must be between 0 and 1"
        );
        ensure!(
            recommend.radar_max_metrics >= 3,
            "recommend.radar_max_metrics must be at least 3"
        );
        Ok(())
    }
}
