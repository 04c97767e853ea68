//! `config`: show the effective config, print its path, or write defaults.

use std::path::Path;

use haulwise_core::PricingConfig;

use crate::cli::ConfigCommand;
use crate::config;
use crate::error::{CliError, CliResult};

pub fn execute(command: &ConfigCommand, path: Option<&Path>) -> CliResult<String> {
    match command {
        ConfigCommand::Show => show(&config::load(path)?),
        ConfigCommand::Path => path
            .map(|p| p.display().to_string())
            .ok_or(CliError::NoConfigPath),
        ConfigCommand::Init { force } => {
            let written = config::init(path, *force)?;
            Ok(format!("Wrote default config to {}", written.display()))
        }
    }
}

fn show(config: &PricingConfig) -> CliResult<String> {
    Ok(toml::to_string_pretty(config)?)
}
