//! Sakuna CLI - Disaster report ETL
//!
//! Usage:
//!   sakuna run [--input <dir>] [--output <dir>] [--workers <n>]
//!   sakuna resolve <location>...
//!   sakuna classify <text>...
//!   sakuna parse <layout.json>

mod output;
mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sakuna_core::{AppConfig, LoggingConfig};
use sakuna_parser::{ParserRegistry, ReportParser};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::pipeline::{load_classifier, load_resolver, report_name, Pipeline};

#[derive(Parser)]
#[command(name = "sakuna")]
#[command(about = "Disaster situation report ETL")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every layout in the input directory
    Run {
        /// Directory of page-layout JSON files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory receiving one folder per report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Documents processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Resolve location strings against the gazetteer
    Resolve {
        /// Comma-separated locations, most specific level first
        #[arg(required = true)]
        locations: Vec<String>,
    },
    /// Classify texts into the disaster taxonomy
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Print the score of every category
        #[arg(long)]
        all_scores: bool,
    },
    /// Recover tables and metadata from one layout file
    Parse {
        path: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Run {
            input,
            output,
            workers,
        } => {
            if let Some(input) = input {
                config.pipeline.input_dir = input;
            }
            if let Some(output) = output {
                config.pipeline.output_dir = output;
            }
            if let Some(workers) = workers {
                config.pipeline.workers = workers;
            }

            let pipeline = Arc::new(Pipeline::load(config).await?);
            let summary = pipeline.run().await?;
            println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
        }
        Commands::Resolve { locations } => {
            let resolver = load_resolver(&config)?;
            let resolved = resolver.match_locations(&locations);

            let rows: Vec<_> = locations
                .iter()
                .zip(&resolved)
                .map(|(location, division)| {
                    let label = division
                        .ids()
                        .first()
                        .and_then(|id| resolver.gazetteer().division(id))
                        .map(|d| d.label.clone());
                    json!({ "location": location, "division": division, "label": label })
                })
                .collect();
            print_json(&json!(rows))?;
        }
        Commands::Classify { texts, all_scores } => {
            let classifier = load_classifier(&config).await?;

            if all_scores {
                let mut rows = Vec::with_capacity(texts.len());
                for text in &texts {
                    let scores = classifier.scores(text).await?;
                    rows.push(json!({ "text": text, "scores": scores }));
                }
                print_json(&json!(rows))?;
            } else {
                let classified = classifier.classify(&texts).await?;
                let rows: Vec<_> = texts
                    .iter()
                    .zip(classified)
                    .map(|(text, c)| json!({ "text": text, "label": c.label, "score": c.score }))
                    .collect();
                print_json(&json!(rows))?;
            }
        }
        Commands::Parse { path } => {
            let layout = ParserRegistry::default()
                .parse(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = report_name(&path, layout.source.as_deref());
            let report = ReportParser::new(config.parser.clone()).parse(&layout, &name);

            let tables = report
                .tables
                .tables
                .iter()
                .map(|t| -> anyhow::Result<(String, serde_json::Value)> {
                    Ok((t.title.clone(), serde_json::to_value(&t.rows)?))
                })
                .collect::<anyhow::Result<serde_json::Map<_, _>>>()?;

            print_json(&json!({
                "metadata": report.metadata,
                "tables": tables,
                "skippedTables": report.tables.skipped_tables,
            }))?;
        }
    }

    Ok(())
}
