//! # haulwise-quote
//!
//! Command-line front end for `haulwise-core`.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize tracing (stderr, RUST_LOG or -v)                         │
//! │  3. Resolve config path (--config, $HAULWISE_CONFIG, platform dir)      │
//! │  4. Load + validate PricingConfig (except `eval`, `config path|init`)   │
//! │  5. Run the command, print its output to stdout                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr so JSON on stdout can be piped.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};
use error::CliResult;

/// Parses arguments, runs the command and prints its output.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = execute(cli)?;
    println!("{output}");
    Ok(())
}

/// Runs a parsed command and returns what should be printed.
pub fn execute(cli: Cli) -> CliResult<String> {
    let config_path = config::resolve_config_path(cli.config);

    // These never read the pricing file, so a broken one must not stop them
    match &cli.command {
        Command::Eval(args) => return commands::formula::execute(args),
        Command::Config(command @ (ConfigCommand::Path | ConfigCommand::Init { .. })) => {
            return commands::config::execute(command, config_path.as_deref());
        }
        _ => {}
    }

    let pricing = config::load(config_path.as_deref())?;
    info!(
        currency = %pricing.currency.code,
        rules = pricing.calculation_rules.len(),
        "Pricing config loaded"
    );

    match &cli.command {
        Command::Calculate(args) => commands::calculate::execute(args, &pricing),
        Command::Eval(args) => commands::formula::execute(args),
        Command::Rules(args) => commands::rules::execute(args, &pricing),
        Command::Estimate(command) => commands::estimate::execute(command, &pricing),
        Command::Config(command) => commands::config::execute(command, config_path.as_deref()),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `-v` - Debug for haulwise crates when `RUST_LOG` is unset
/// - Default: warnings only, so piped output stays clean
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "warn,haulwise_core=debug,haulwise_quote=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
