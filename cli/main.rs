#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use cohortlens::config::AnalysisConfig;
use cohortlens::heatmap::run_heatmap;
use cohortlens::prevalence::run_prevalence;
use log::info;
use std::path::PathBuf;
use std::process;

#[derive(Args)]
pub struct CommonArgs {
    /// Path to the survey CSV (defaults to Cleaning_data_cleaned.csv)
    #[arg(value_name = "CSV_PATH")]
    pub input: Option<PathBuf>,

    /// TOML file overriding the built-in thresholds and paths
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct HeatmapArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory the figure is written into (created if needed)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Largest feature count for which cell values are printed
    #[arg(long, value_name = "N")]
    pub annotate_threshold: Option<usize>,

    /// Output resolution in dots per inch
    #[arg(long)]
    pub dpi: Option<u32>,
}

#[derive(Args)]
pub struct PrevalenceArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Self-reported diagnosis column
    #[arg(long, value_name = "NAME")]
    pub self_report_column: Option<String>,

    /// Glycated haemoglobin column
    #[arg(long, value_name = "NAME")]
    pub biomarker_column: Option<String>,

    /// Biomarker readings at or above this value count as positive
    #[arg(long, value_name = "VALUE")]
    pub biomarker_cutoff: Option<f64>,
}

fn load_config(common: &CommonArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &common.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(input) = &common.input {
        config.input = input.clone();
    }
    Ok(config)
}

pub fn heatmap(args: HeatmapArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.common)?;
    if let Some(dir) = args.out_dir {
        config.heatmap.output_dir = dir;
    }
    if let Some(threshold) = args.annotate_threshold {
        config.heatmap.annotate_threshold = threshold;
    }
    if let Some(dpi) = args.dpi {
        config.heatmap.dpi = dpi;
    }
    config.validate()?;

    let summary = run_heatmap(&config.input, &config.heatmap)?;
    info!(
        "Heatmap complete: {} features, annotated: {}",
        summary.n_features, summary.annotated
    );
    Ok(())
}

pub fn prevalence(args: PrevalenceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.common)?;
    if let Some(column) = args.self_report_column {
        config.prevalence.self_report_column = column;
    }
    if let Some(column) = args.biomarker_column {
        config.prevalence.biomarker_column = column;
    }
    if let Some(cutoff) = args.biomarker_cutoff {
        config.prevalence.biomarker_cutoff = cutoff;
    }
    config.validate()?;

    run_prevalence(&config.input, &config.prevalence)?;
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "cohortlens",
    about = "Correlation heatmaps and undiagnosed-prevalence counts for health-survey CSVs",
    long_about = "Two independent analyses over a health-survey CSV extract: a Pearson \
                 correlation heatmap of its numeric columns, and a count of respondents \
                 whose HbA1c reading suggests diabetes they have not reported."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the Pearson correlation heatmap of all numeric columns
    #[command(about = "Render a Pearson correlation heatmap (outputs: figures/*.png)")]
    Heatmap(HeatmapArgs),

    /// Count biomarker-positive respondents without a self-reported diagnosis
    #[command(about = "Estimate inferred undiagnosed prevalence")]
    Prevalence(PrevalenceArgs),

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Heatmap(args)) => heatmap(args),
        Some(Commands::Prevalence(args)) => prevalence(args),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if seconds < MINUTE {
        format!("{} seconds ago", seconds)
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("COHORTLENS_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("cohortlens {}", version);

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
