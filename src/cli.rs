use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile CSV files and turn them into chart-ready insights", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a semantic type and statistics for every column
    Profile(ProfileArgs),
    /// Suggest charts based on the inferred column profiles
    Recommend(RecommendArgs),
    /// Materialize recommended (or supplied) insights into chart payloads
    Chart(ChartArgs),
    /// Print a descriptive overview or answer a keyword question
    Summary(SummaryArgs),
    /// Write the default configuration to a YAML file
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding inference and recommendation thresholds
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Include the retained raw values in JSON output
    #[arg(long = "with-values", requires = "json")]
    pub with_values: bool,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Insight ids to materialize (repeatable or comma-separated)
    #[arg(long = "id", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub ids: Vec<String>,
    /// Materialize every recommended insight
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
    /// JSON file holding insight descriptors to use instead of recommendations
    #[arg(long = "descriptors")]
    pub descriptors: Option<PathBuf>,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Question to route by keyword (e.g. "give me an overview")
    #[arg(long)]
    pub ask: Option<String>,
    /// Emit JSON instead of text
    #[arg(long, conflicts_with = "ask")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
