pub mod chart;
pub mod chart_cmd;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod io_utils;
pub mod recommend;
pub mod schema;
pub mod summary;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands, InputArgs};
use crate::config::InsightConfig;
use crate::dataset::Dataset;
use crate::schema::ColumnProfile;

pub use crate::chart::{ChartPayload, transform_for_chart};
pub use crate::recommend::{InsightDescriptor, recommend_insights};
pub use crate::schema::infer_schema;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => handle_profile(&args),
        Commands::Recommend(args) => handle_recommend(&args),
        Commands::Chart(args) => chart_cmd::execute(&args),
        Commands::Summary(args) => handle_summary(&args),
        Commands::Config(args) => handle_config(&args),
    }
}

/// A dataset read from disk together with its profiles and the
/// configuration used to build them.
pub struct LoadedSource {
    pub dataset: Dataset,
    pub profiles: Vec<ColumnProfile>,
    pub config: InsightConfig,
}

pub(crate) fn load_source(args: &InputArgs) -> Result<LoadedSource> {
    let config = InsightConfig::load_or_default(args.config.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let dataset = dataset::load_csv(&args.input, delimiter, encoding)
        .with_context(|| format!("Loading dataset from {:?}", args.input))?;
    let profiles = schema::infer_schema_with(&dataset, &config.inference);
    debug!(
        "Profiled {} column(s) across {} row(s)",
        profiles.len(),
        dataset.row_count()
    );
    Ok(LoadedSource {
        dataset,
        profiles,
        config,
    })
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    if args.json {
        let mut profiles = loaded.profiles;
        if !args.with_values {
            profiles.iter_mut().for_each(|p| p.values.clear());
        }
        io_utils::write_json(None, &profiles)?;
    } else {
        let headers = ["column", "type", "present", "nulls", "unique", "complete"]
            .map(String::from)
            .to_vec();
        let rows = loaded
            .profiles
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.column_type.to_string(),
                    p.values.len().to_string(),
                    p.null_count.to_string(),
                    p.unique_count.to_string(),
                    format!("{:.1}%", p.completeness() * 100.0),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    info!(
        "Profiled {} column(s) over {} row(s)",
        loaded.dataset.headers().len(),
        loaded.dataset.row_count()
    );
    Ok(())
}

fn handle_recommend(args: &cli::RecommendArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    let insights = recommend::recommend_insights_with(
        &loaded.dataset,
        &loaded.profiles,
        &loaded.config.recommend,
    );
    if args.json {
        io_utils::write_json(None, &insights)?;
    } else {
        let headers = ["id", "chart", "title", "x", "y", "group", "metrics"]
            .map(String::from)
            .to_vec();
        let rows = insights
            .iter()
            .map(|insight| {
                vec![
                    insight.id.clone(),
                    insight.chart_type.to_string(),
                    insight.title.clone(),
                    insight.x_axis.clone().unwrap_or_default(),
                    insight.y_axis.clone().unwrap_or_default(),
                    insight.group_by.clone().unwrap_or_default(),
                    insight.metrics.join(","),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    info!("Recommended {} insight(s)", insights.len());
    Ok(())
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let loaded = load_source(&args.source)?;
    if args.json {
        let report = serde_json::json!({
            "overview": summary::overview(&loaded.dataset, &loaded.profiles),
            "statistics": summary::numeric_statistics(&loaded.profiles),
        });
        return io_utils::write_json(None, &report);
    }
    let text = match &args.ask {
        Some(question) => summary::respond(question, &loaded.dataset, &loaded.profiles),
        None => {
            let overview = summary::overview(&loaded.dataset, &loaded.profiles);
            let stats = summary::numeric_statistics(&loaded.profiles);
            format!(
                "{}\n{}",
                summary::render_overview(&overview),
                summary::render_statistics(&stats, loaded.dataset.row_count())
            )
        }
    };
    print!("{text}");
    Ok(())
}

fn handle_config(args: &cli::ConfigArgs) -> Result<()> {
    InsightConfig::default()
        .save(&args.output)
        .with_context(|| format!("Writing config to {:?}", args.output))?;
    info!("Default configuration written to {:?}", args.output);
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
