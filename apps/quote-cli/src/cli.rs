//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(name = "haulwise-quote")]
#[command(version, about = "Quote pricing engine for Haulwise")]
pub struct Cli {
    /// Path to the pricing config (TOML). Defaults to $HAULWISE_CONFIG or
    /// the platform config directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calculate quote totals from a JSON CalculationInput
    Calculate(CalculateArgs),

    /// Evaluate a formula
    Eval(EvalArgs),

    /// Apply the configured calculation rules to a JSON object of fields
    Rules(RulesArgs),

    /// Run a built-in estimate with the configured coefficients
    #[command(subcommand)]
    Estimate(EstimateCommand),

    /// Inspect or create the pricing config
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Args)]
pub struct CalculateArgs {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Round amounts to the currency's decimals in JSON output
    #[arg(long)]
    pub round: bool,

    /// Fail if the result has a negative total or margin, or an oversized discount
    #[arg(long)]
    pub reject_degenerate: bool,
}

#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Formula, e.g. "rooms * 150 * 1.2"
    pub formula: String,

    /// Variable binding, repeatable
    #[arg(long = "var", value_name = "NAME=NUMBER")]
    pub vars: Vec<String>,

    /// Print 0 instead of failing
    #[arg(long)]
    pub best_effort: bool,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Record failing rules and use 0 instead of failing
    #[arg(long)]
    pub best_effort: bool,
}

#[derive(Debug, Subcommand)]
pub enum EstimateCommand {
    /// Packed volume (cubic feet) for a number of rooms
    Volume {
        #[arg(long)]
        rooms: Decimal,
    },
    /// Moving cost for a volume and distance (miles)
    Moving {
        #[arg(long)]
        volume: Decimal,
        #[arg(long)]
        distance: Decimal,
    },
    /// Labor cost for a crew
    Labor {
        #[arg(long)]
        hours: Decimal,
        #[arg(long)]
        workers: Decimal,
    },
    /// Storage cost for a volume over a number of months
    Storage {
        #[arg(long)]
        cubic_feet: Decimal,
        #[arg(long)]
        months: Decimal,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective config as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
