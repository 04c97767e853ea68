//! # Money Module
//!
//! Rounding and display helpers for decimal amounts.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate()          → exact Decimal values (stored on the quote)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  round_currency()     → 2 places for the PDF / email / CLI summary     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  format_currency()    → "$1,234.57"                                    │
//! │                                                                         │
//! │  Rounding before storing would make totals drift when a quote is        │
//! │  re-opened and recalculated, so the engine never rounds on its own.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use haulwise_core::config::CurrencyConfig;
//! use haulwise_core::money::{format_currency, format_percentage};
//! use rust_decimal_macros::dec;
//!
//! let usd = CurrencyConfig::default();
//! assert_eq!(format_currency(dec!(1234.567), &usd), "$1,234.57");
//! assert_eq!(format_percentage(dec!(42.3868)), "42.39%");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::CurrencyConfig;

/// Decimal places used for percentages in presentation.
pub const PERCENT_DECIMALS: u32 = 2;

/// Rounds an amount to `decimals` places, halves away from zero.
///
/// Half-away-from-zero matches what the web app's `Intl.NumberFormat`
/// shows, so the CLI, PDFs and browser agree to the cent.
///
/// ## Example
/// ```rust
/// use haulwise_core::money::round_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_currency(dec!(0.125), 2), dec!(0.13));
/// assert_eq!(round_currency(dec!(-0.125), 2), dec!(-0.13));
/// ```
#[inline]
pub fn round_currency(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with the currency symbol and thousands separators.
///
/// ## Example
/// ```rust
/// use haulwise_core::config::CurrencyConfig;
/// use haulwise_core::money::format_currency;
/// use rust_decimal_macros::dec;
///
/// let usd = CurrencyConfig::default();
/// assert_eq!(format_currency(dec!(-5.5), &usd), "-$5.50");
/// assert_eq!(format_currency(dec!(0), &usd), "$0.00");
/// ```
pub fn format_currency(amount: Decimal, currency: &CurrencyConfig) -> String {
    let decimals = currency.decimals;
    let rounded = round_currency(amount, decimals);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    // Fixed-point text of the absolute value, e.g. "1234.57"
    let mut fixed = rounded.abs();
    fixed.rescale(decimals);
    let text = fixed.to_string();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (text.as_str(), None),
    };

    let mut out = format!("{sign}{}{}", currency.symbol, group_thousands(whole));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Formats a percentage with two decimals: `42.39%`.
pub fn format_percentage(value: Decimal) -> String {
    let mut rounded = round_currency(value, PERCENT_DECIMALS);
    rounded.rescale(PERCENT_DECIMALS);
    format!("{rounded}%")
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
