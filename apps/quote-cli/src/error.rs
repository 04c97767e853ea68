//! # CLI Error Handling
//!
//! One error type for everything the terminal user can run into.
//!
//! ```text
//! CoreError ──┐
//! io::Error ──┤
//! JSON/TOML ──┼──► CliError ──► main: stderr report + exit code 1
//! --var ──────┘
//! ```

use std::path::PathBuf;

use haulwise_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the `haulwise-quote` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Pricing engine rejected the input or config.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading input or writing the config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input was not valid JSON for the command.
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid TOML.
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML.
    #[error("Could not serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// No platform config directory and no explicit path.
    #[error("No config path available; pass --config or set HAULWISE_CONFIG")]
    NoConfigPath,

    /// `config init` would overwrite an existing file.
    #[error("Config file already exists: {} (use --force to overwrite)", .0.display())]
    ConfigExists(PathBuf),

    /// A `--var` argument that is not `name=number`.
    #[error("Invalid variable '{0}': expected NAME=NUMBER")]
    InvalidVar(String),
}

impl CliError {
    /// Short machine-readable category, logged alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
            CliError::Core(CoreError::Formula(_)) | CliError::Core(CoreError::Rule { .. }) => {
                "FORMULA_ERROR"
            }
            CliError::Core(CoreError::Degenerate(_)) => "DEGENERATE_RESULT",
            CliError::Core(_) => "CONFIG_ERROR",
            CliError::Io(_) => "IO_ERROR",
            CliError::Json(_) | CliError::InvalidVar(_) => "INVALID_INPUT",
            CliError::ConfigParse(_)
            | CliError::ConfigSerialize(_)
            | CliError::NoConfigPath
            | CliError::ConfigExists(_) => "CONFIG_ERROR",
        }
    }
    /// The line printed to stderr when a command fails. Independent of the
    /// log filter, so `RUST_LOG=off` still shows why the exit code is 1.
    pub fn report(&self) -> String {
        format!("error[{}]: {self}", self.code())
    }
}

/// Result alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
