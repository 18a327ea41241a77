//! EU Car Predict CLI
//!
//! A command-line tool for estimating used-car market price bands and
//! browsing the brand/model catalogue the models were trained on.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{catalog, predict};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use valuation_lib::{StructuredLogger, ValuationConfig, ValuationContext, ValuationMetrics};

const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// EU Car Predict CLI
#[derive(Parser)]
#[command(name = "carval")]
#[command(author, version, about = "Used-car price band estimator for the EU market", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "CARVAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Artifact directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub artifacts: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the market price band of a listing
    Predict(predict::PredictArgs),

    /// List known brands and their prestige tiers
    Brands,

    /// List known models of a brand
    Models {
        /// Brand name
        #[arg(long, short)]
        brand: String,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_context(cli: &Cli) -> Result<Arc<ValuationContext>> {
    let mut config = ValuationConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(dir) = &cli.artifacts {
        config.artifact_dir = dir.clone();
    }

    let logger = StructuredLogger::new("carval-cli");
    logger.log_startup(CLI_VERSION, &config.artifact_dir.display().to_string());

    let artifact_dir = config.artifact_dir.clone();
    let context = ValuationContext::load(config)
        .with_context(|| format!("failed to load artifacts from {}", artifact_dir.display()))?;
    logger.log_artifacts_loaded(
        context.mapping().version(),
        context.technical().version(),
        context.brand().version(),
    );

    Ok(Arc::new(context))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let context = load_context(&cli)?;

    let outcome = match &cli.command {
        Commands::Predict(args) => predict::run(context, args, cli.format),
        Commands::Brands => catalog::list_brands(&context, cli.format),
        Commands::Models { brand } => catalog::list_models(&context, brand, cli.format),
    };

    if cli.metrics {
        eprint!("{}", ValuationMetrics::new().render());
    }

    outcome
}
