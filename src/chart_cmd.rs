use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use itertools::Itertools;
use log::info;

use crate::{
    chart::{self, ChartPayload},
    cli::ChartArgs,
    dataset::Dataset,
    io_utils,
    recommend::InsightDescriptor,
};

pub fn execute(args: &ChartArgs) -> Result<()> {
    let loaded = crate::load_source(&args.source)?;
    let candidates = match &args.descriptors {
        Some(path) => load_descriptors(path)?,
        None => crate::recommend::recommend_insights_with(
            &loaded.dataset,
            &loaded.profiles,
            &loaded.config.recommend,
        ),
    };

    let selected = select_descriptors(&candidates, &args.ids, args.all || args.descriptors.is_some())?;
    let payloads = render(&loaded.dataset, &selected);
    io_utils::write_json(args.output.as_deref(), &payloads)?;

    let samples = payloads.iter().filter(|p| p.sample).count();
    info!(
        "Materialized {} chart payload(s) ({} sample fallback(s))",
        payloads.len(),
        samples
    );
    Ok(())
}

pub fn render(dataset: &Dataset, descriptors: &[&InsightDescriptor]) -> Vec<ChartPayload> {
    chart::transform_all(dataset, descriptors.iter().copied())
}

/// Picks descriptors by id in the order requested; `all` keeps every
/// candidate in recommendation order.
pub fn select_descriptors<'a>(
    candidates: &'a [InsightDescriptor],
    ids: &[String],
    all: bool,
) -> Result<Vec<&'a InsightDescriptor>> {
    if ids.is_empty() {
        if all {
            return Ok(candidates.iter().collect());
        }
        bail!("Select insights with --id or pass --all");
    }
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
        .map(|id| {
            candidates
                .iter()
                .find(|descriptor| descriptor.id == id)
                .ok_or_else(|| {
                    anyhow!(
                        "Insight '{id}' is not available (choose from: {})",
                        candidates.iter().map(|d| d.id.as_str()).join(", ")
                    )
                })
        })
        .collect()
}

fn load_descriptors(path: &Path) -> Result<Vec<InsightDescriptor>> {
    let file = File::open(path).with_context(|| format!("Opening descriptors file {path:?}"))?;
    let descriptors: Vec<InsightDescriptor> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing descriptors from {path:?}"))?;
    Ok(descriptors)
}
