use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tidy_lab::clean::numeric::{is_numeric_leaning, NUMERIC_MAJORITY};
use tidy_lab::clean::shape::ColumnClasses;
use tidy_lab::config::{Config, ParsedConfig, TransformModel};
use tidy_lab::data::{export, loader};

/// Distinct labels shown per categorical column by `inspect`.
const LABEL_PREVIEW: usize = 6;

#[derive(Parser)]
#[command(name = "tidy-lab", about = "Clean messy lab tables into tidy data for plotting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cleaning pipeline on a table
    Clean {
        /// Input table (CSV, JSON records, Parquet or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Run configuration (.json, or the `Key: value` text format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Plot type, overrides the config file
        #[arg(long)]
        graph: Option<String>,

        /// Transform model: linear, log2, log10 or ln
        #[arg(long)]
        model: Option<TransformModel>,

        /// Independent variable column, overrides the config file
        #[arg(long)]
        x: Option<String>,

        /// Dependent variable column, overrides the config file
        #[arg(long)]
        y: Option<String>,

        /// Output CSV. Without it the result is printed as JSON records.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how the cleaner classifies each column
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Clean {
            input,
            config,
            graph,
            model,
            x,
            y,
            output,
        } => {
            let ParsedConfig {
                config: mut cfg,
                unsafe_flags,
            } = match config {
                Some(path) => Config::from_path(&path)?,
                None => ParsedConfig::default(),
            };
            if let Some(graph) = graph {
                cfg = cfg.with_graph(graph);
            }
            if let Some(model) = model {
                cfg = cfg.with_model(model);
            }
            if let Some(x) = x {
                cfg = cfg.with_independent(x);
            }
            if let Some(y) = y {
                cfg = cfg.with_dependent(y);
            }

            let table = loader::load_file(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            let report = tidy_lab::clean(table, &cfg).context("cleaning pipeline failed")?;

            for flag in &unsafe_flags {
                eprintln!("UNSAFE: {flag}");
            }
            for d in report.diagnostics.entries() {
                eprintln!("{d}");
            }
            eprintln!("{}", report.summary());

            match output {
                Some(path) => export::write_csv(&report.table, &path)?,
                None => println!(
                    "{}",
                    serde_json::to_string_pretty(&export::to_json_records(&report.table))?
                ),
            }
        }
        Commands::Inspect { input } => {
            let table = loader::load_file(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            println!("{} rows × {} columns", table.n_rows(), table.n_cols());
            for col in table.columns() {
                let missing = col.cells.iter().filter(|c| c.is_missing()).count();
                if is_numeric_leaning(col, NUMERIC_MAJORITY) {
                    println!("  {:<24} {:<12} {missing} missing", col.name, "numeric");
                } else {
                    println!(
                        "  {:<24} {:<12} {missing} missing  [{}]",
                        col.name,
                        "categorical",
                        col.label_preview(LABEL_PREVIEW)
                    );
                }
            }
            let classes = ColumnClasses::of(&table);
            println!(
                "layout: {} ({} numeric vs {} categorical)",
                if classes.is_wide() { "wide" } else { "long" },
                classes.numeric.len(),
                classes.other.len()
            );
        }
    }

    Ok(())
}
