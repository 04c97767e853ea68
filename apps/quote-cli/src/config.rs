//! # Config Loading
//!
//! Builds the effective [`PricingConfig`] for a CLI invocation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HAULWISE_CURRENCY=CAD                                              │
//! │     HAULWISE_CURRENCY_SYMBOL=C$                                        │
//! │     HAULWISE_TAX_RATE=13                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else $HAULWISE_CONFIG, else                       │
//! │     ~/.config/haulwise-quote/pricing.toml (Linux)                      │
//! │     ~/Library/Application Support/com.haulwise.quote/pricing.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, 0% tax, built-in estimate coefficients, no rules              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use haulwise_core::PricingConfig;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "HAULWISE_CONFIG";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "pricing.toml";

/// Resolves which config file to use.
///
/// An explicit `--config` wins, then `HAULWISE_CONFIG`, then the platform
/// config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .or_else(default_config_path)
}

/// Returns the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "haulwise", "quote")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Loads defaults, then the TOML file (if it exists), then environment
/// overrides, and validates the result.
pub fn load(path: Option<&Path>) -> CliResult<PricingConfig> {
    let mut config = PricingConfig::default();

    if let Some(path) = path {
        if path.exists() {
            info!(?path, "Loading pricing config from file");
            let contents = std::fs::read_to_string(path)?;
            config = toml::from_str(&contents)?;
        } else {
            debug!(?path, "Config file not found, using defaults");
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Writes the config as pretty TOML, creating parent directories.
pub fn save(config: &PricingConfig, path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;

    info!(?path, "Pricing config saved");
    Ok(())
}

/// Writes a default config file unless one exists and `force` is false.
pub fn init(path: Option<&Path>, force: bool) -> CliResult<PathBuf> {
    let path = path.ok_or(CliError::NoConfigPath)?;
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }
    save(&PricingConfig::default(), path)?;
    Ok(path.to_path_buf())
}

/// Applies `HAULWISE_*` overrides read through `lookup`.
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides<F>(config: &mut PricingConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(code) = lookup("HAULWISE_CURRENCY") {
        debug!(currency = %code, "Overriding currency from environment");
        config.currency.code = code;
    }

    if let Some(symbol) = lookup("HAULWISE_CURRENCY_SYMBOL") {
        config.currency.symbol = symbol;
    }

    if let Some(rate) = lookup("HAULWISE_TAX_RATE") {
        match rate.trim().parse::<Decimal>() {
            Ok(parsed) => {
                debug!(tax_rate = %parsed, "Overriding default tax rate from environment");
                config.default_tax_rate_percent = parsed;
            }
            Err(_) => warn!(value = %rate, "Ignoring invalid HAULWISE_TAX_RATE"),
        }
    }
}
