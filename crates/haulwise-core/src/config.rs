//! # Pricing Configuration
//!
//! Everything a tenant can tune about pricing, as one explicit value the
//! caller passes in. Calculation code never consults compiled-in globals.
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! version = 1
//! default_tax_rate_percent = "8.25"
//!
//! [currency]
//! code = "USD"
//! symbol = "$"
//! decimals = 2
//!
//! [estimates]
//! avg_room_size_sqft = "150"
//! packing_factor = "1.2"
//! hourly_rate = "50"
//!
//! [[calculation_rules]]
//! id = "volume"
//! name = "Estimated volume"
//! formula = "rooms * 150 * 1.2"
//! output_field = "estimatedVolume"
//! trigger_fields = ["rooms"]
//! ```
//!
//! This crate only defines and validates the types. Reading the file and
//! applying environment overrides is the application's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::estimates::EstimateCoefficients;
use crate::rules::{CalculationRule, RuleSet};
use crate::validation::validate_non_negative;

/// Newest config schema this build understands.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Maximum number of minor-unit digits a currency may declare.
pub const MAX_CURRENCY_DECIMALS: u32 = 6;

// =============================================================================
// Currency
// =============================================================================

/// Display settings for the tenant's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code, e.g. `USD`.
    #[serde(default = "default_currency_code")]
    pub code: String,

    /// Symbol placed before amounts, e.g. `$`.
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Minor-unit digits used when rounding for display.
    #[serde(default = "default_currency_decimals")]
    pub decimals: u32,
}

fn default_currency_code() -> String {
    "USD".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u32 {
    2
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            decimals: default_currency_decimals(),
        }
    }
}

// =============================================================================
// Pricing Config
// =============================================================================

/// Versioned tenant pricing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Schema version of this document.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Tax rate used when a request does not carry one.
    #[serde(default)]
    pub default_tax_rate_percent: Decimal,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub estimates: EstimateCoefficients,

    /// Calculated-field rules, in evaluation order.
    #[serde(default)]
    pub calculation_rules: Vec<CalculationRule>,
}

fn default_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            version: default_version(),
            default_tax_rate_percent: Decimal::ZERO,
            currency: CurrencyConfig::default(),
            estimates: EstimateCoefficients::default(),
            calculation_rules: Vec::new(),
        }
    }
}

impl PricingConfig {
    /// Validates the configuration.
    ///
    /// ## Errors
    /// - `CoreError::UnsupportedConfigVersion` for version 0 or a newer schema
    /// - `ValidationError` for a negative default tax rate or coefficient,
    ///   an empty currency code or too many currency decimals
    /// - Any [`RuleSet::compile`] error
    pub fn validate(&self) -> CoreResult<()> {
        if self.version == 0 || self.version > CONFIG_SCHEMA_VERSION {
            return Err(CoreError::UnsupportedConfigVersion {
                found: self.version,
                supported: CONFIG_SCHEMA_VERSION,
            });
        }

        validate_non_negative("default_tax_rate_percent", self.default_tax_rate_percent)?;

        if self.currency.code.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "currency.code".to_string(),
            }
            .into());
        }
        if self.currency.decimals > MAX_CURRENCY_DECIMALS {
            return Err(ValidationError::OutOfRange {
                field: "currency.decimals".to_string(),
                min: "0".to_string(),
                max: MAX_CURRENCY_DECIMALS.to_string(),
            }
            .into());
        }

        self.estimates.validate()?;
        let rules = self.rule_set()?;

        debug!(
            version = self.version,
            currency = %self.currency.code,
            rules = rules.len(),
            "Pricing config validated"
        );
        Ok(())
    }

    /// Compiles the configured calculation rules.
    pub fn rule_set(&self) -> CoreResult<RuleSet> {
        RuleSet::compile(self.calculation_rules.iter().cloned())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
