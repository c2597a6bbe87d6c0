use anyhow::Result;
use clap::{Parser, Subcommand};
use eventgate::config::{DedupeConfig, ValidationConfig};
use eventgate::pipeline;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "eventgate")]
#[command(about = "Disruption event consolidation and reference validation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collapse multiple mentions of the same disruption into one record
    Consolidate {
        /// Extraction output to consolidate (.jsonl or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the consolidated event table
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Cross-check extracted events against cached reference datasets
    Validate {
        /// Extracted events to validate (.jsonl or .csv)
        #[arg(short, long)]
        extracted: PathBuf,

        /// Directory holding the cached reference dataset files
        #[arg(long, default_value = "cache/floods")]
        cache_dir: PathBuf,

        /// Directory for validation outputs
        #[arg(short, long, default_value = "validation_outputs")]
        output_dir: PathBuf,

        /// Override the combined-score threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Disruption types in scope (repeatable; default: flood)
        #[arg(long = "event-type")]
        event_types: Vec<String>,

        /// Validate every disruption type
        #[arg(long)]
        all_types: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Consolidate { input, output_dir } => {
            info!("Consolidating {}", input.display());
            let stats = pipeline::run_consolidation(&input, &output_dir, &DedupeConfig::default())?;

            println!("\n=== Consolidation Summary ===");
            println!(
                "{} records -> {} events ({:.1}% reduction)",
                stats.total_before, stats.total_after, stats.reduction_pct
            );
            println!("Outputs written to {}", output_dir.display());
        }

        Command::Validate {
            extracted,
            cache_dir,
            output_dir,
            threshold,
            event_types,
            all_types,
        } => {
            let mut config = ValidationConfig::default();
            if let Some(threshold) = threshold {
                config.matching.score_threshold = threshold;
            }
            if all_types {
                config.allowed_types = None;
            } else if !event_types.is_empty() {
                config.allowed_types = Some(event_types);
            }

            info!("Validating {}", extracted.display());
            let summary = pipeline::run_validation(&extracted, &cache_dir, &output_dir, &config)?;

            println!("\n=== Validation Summary ===");
            println!(
                "Forward: {}/{} matched ({:.1}%)",
                summary.forward_matched,
                summary.forward_total,
                100.0 * summary.forward_match_rate
            );
            println!(
                "Inverse: {}/{} matched ({:.1}%)",
                summary.inverse_matched,
                summary.inverse_total,
                100.0 * summary.inverse_match_rate
            );
            println!("Outputs written to {}", output_dir.display());
        }
    }

    Ok(())
}
