//! # haulwise-core: Pure Pricing Logic for Haulwise
//!
//! This crate is the **pricing engine** of the Haulwise CRM. It turns quote
//! and invoice line items into totals, evaluates tenant-defined calculated
//! fields, and provides the built-in moving estimates. It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Haulwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Web App / Back Office / quote-cli                │   │
//! │  │   Quote editor ──► Invoice editor ──► Custom fields ──► PDF    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CalculationInput / FormulaContext      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ haulwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │ calculator │  │  formula  │  │   rules   │  │ estimates │ │   │
//! │  │   │  totals    │  │  sandbox  │  │ calculated│  │  volume   │ │   │
//! │  │   │  margin    │  │  parser   │  │  fields   │  │  labor    │ │   │
//! │  │   └────────────┘  └───────────┘  └───────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ CalculationResult                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             Caller stores the snapshot on the quote             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line items and calculation input
//! - [`calculator`] - Line totals, aggregate totals, margin, warnings
//! - [`formula`] - Sandboxed arithmetic for calculated fields
//! - [`rules`] - Ordered calculation rules over a formula context
//! - [`estimates`] - Built-in volume, moving, labor and storage formulas
//! - [`config`] - Versioned tenant pricing configuration
//! - [`money`] - Presentation rounding and formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output, no hidden state
//! 2. **No I/O**: reading files or the environment is the caller's job
//! 3. **Exact Money**: `Decimal` everywhere money is involved; rounding only
//!    for presentation
//! 4. **Explicit Errors**: malformed input is rejected, never clamped
//!
//! ## Example Usage
//!
//! ```rust
//! use haulwise_core::{calculate, CalculationInput, LineItem, LineItemKind};
//! use rust_decimal_macros::dec;
//!
//! let input = CalculationInput::new(vec![
//!     LineItem::new(LineItemKind::Service, dec!(4), dec!(120)).taxable(true),
//! ])
//! .with_tax_rate(dec!(8.25));
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.subtotal, dec!(480));
//! assert_eq!(result.tax_amount, dec!(39.6));
//! assert_eq!(result.total, dec!(519.6));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod config;
pub mod error;
pub mod estimates;
pub mod formula;
pub mod money;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use haulwise_core::calculate` instead of
// `use haulwise_core::calculator::calculate`

pub use calculator::{calculate, compute_line_totals, CalculationResult, DegenerateResult, LineTotals};
pub use config::{CurrencyConfig, PricingConfig};
pub use error::{CoreError, CoreResult, FormulaError, ValidationError};
pub use estimates::EstimateCoefficients;
pub use formula::{evaluate, EvalMode, Formula, FormulaContext};
pub use rules::{CalculationRule, RuleEvaluation, RuleSet};
pub use types::*;
