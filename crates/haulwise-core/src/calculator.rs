//! # Quote Calculator
//!
//! Turns a list of line items plus tax/discount parameters into the totals
//! shown on a quote or invoice.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     calculate(input)                                    │
//! │                                                                         │
//! │  line items ──► compute_line_totals() per item (validated, exact)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = Σ line_total            taxable = Σ line_total (taxable)   │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  discount = percent > 0 ? subtotal × percent / 100 : fixed amount      │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  tax = (taxable − discount × taxable/subtotal) × rate / 100            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total = subtotal − discount + tax                                     │
//! │  margin = total − Σ line_cost_total                                    │
//! │  margin% = total > 0 ? margin / total × 100 : 0                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount Allocation
//! The discount is spread over the lines in proportion to their share of the
//! subtotal, and only the taxable share reduces the tax base. A 10% discount
//! on a quote that is 80% taxable removes 8% of the subtotal from the base.
//!
//! ## Rounding
//! Nothing here rounds. `Decimal` keeps `quantity * unit_price` exact; use
//! [`CalculationResult::rounded`] for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{round_currency, PERCENT_DECIMALS};
use crate::types::CalculationInput;
use crate::validation::{
    validate_discount_amount, validate_discount_percent, validate_non_negative,
    validate_tax_rate_percent,
};

// =============================================================================
// Line Totals
// =============================================================================

/// Totals for a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    /// `quantity * unit_price`
    pub line_total: Decimal,
    /// `quantity * unit_cost`
    pub line_cost_total: Decimal,
}

/// Computes the customer-facing and internal totals of one line.
///
/// ## Rules
/// - `quantity`, `unit_price` and `unit_cost` must be >= 0
/// - `unit_cost` defaults to zero
/// - No rounding
///
/// ## Example
/// ```rust
/// use haulwise_core::calculator::compute_line_totals;
/// use rust_decimal_macros::dec;
///
/// let totals = compute_line_totals(dec!(2.5), dec!(80), Some(dec!(45))).unwrap();
/// assert_eq!(totals.line_total, dec!(200));
/// assert_eq!(totals.line_cost_total, dec!(112.5));
/// ```
pub fn compute_line_totals(
    quantity: Decimal,
    unit_price: Decimal,
    unit_cost: Option<Decimal>,
) -> CoreResult<LineTotals> {
    line_totals_for("", quantity, unit_price, unit_cost)
}

/// Same as [`compute_line_totals`] but prefixes field names in errors
/// (`lineItems[3].quantity`).
fn line_totals_for(
    prefix: &str,
    quantity: Decimal,
    unit_price: Decimal,
    unit_cost: Option<Decimal>,
) -> CoreResult<LineTotals> {
    let field = |name: &str| format!("{prefix}{name}");
    let unit_cost = unit_cost.unwrap_or(Decimal::ZERO);

    validate_non_negative(&field("quantity"), quantity)?;
    validate_non_negative(&field("unitPrice"), unit_price)?;
    validate_non_negative(&field("unitCost"), unit_cost)?;

    let line_total = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| ValidationError::TooLarge {
            field: field("lineTotal"),
        })?;
    let line_cost_total = quantity
        .checked_mul(unit_cost)
        .ok_or_else(|| ValidationError::TooLarge {
            field: field("lineCostTotal"),
        })?;

    Ok(LineTotals {
        line_total,
        line_cost_total,
    })
}

// =============================================================================
// Calculation Result
// =============================================================================

/// Output of one pricing pass.
///
/// Built fresh by [`calculate`]; every field is derived from the input.
/// Attach it to the quote/invoice version it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Sum of all line totals.
    #[ts(as = "String")]
    pub subtotal: Decimal,

    /// Discount actually applied (percentage resolved to an amount).
    #[ts(as = "String")]
    pub discount_amount: Decimal,

    /// Sum of taxable line totals, before the discount share is removed.
    #[ts(as = "String")]
    pub taxable_items_total: Decimal,

    /// Tax charged on the discounted taxable share.
    #[ts(as = "String")]
    pub tax_amount: Decimal,

    /// `subtotal - discount_amount + tax_amount`
    #[ts(as = "String")]
    pub total: Decimal,

    /// Internal cost basis (sum of line cost totals).
    #[ts(as = "String")]
    pub estimated_cost: Decimal,

    /// `total - estimated_cost`
    #[ts(as = "String")]
    pub margin: Decimal,

    /// `margin / total * 100`, or zero when total is not positive.
    #[ts(as = "String")]
    pub margin_percentage: Decimal,
}

/// A structurally valid result the business may not want.
///
/// These are warnings. A moving company may quote at a loss to win a
/// corporate account, so the calculation still succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateResult {
    /// Fixed discount larger than the subtotal.
    DiscountExceedsSubtotal,
    /// The customer would be owed money.
    NegativeTotal,
    /// Costs exceed what is charged.
    NegativeMargin,
}

impl std::fmt::Display for DegenerateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegenerateResult::DiscountExceedsSubtotal => write!(f, "discount exceeds subtotal"),
            DegenerateResult::NegativeTotal => write!(f, "negative total"),
            DegenerateResult::NegativeMargin => write!(f, "negative margin"),
        }
    }
}

impl CalculationResult {
    /// Returns the warning conditions present in this result.
    pub fn warnings(&self) -> Vec<DegenerateResult> {
        let mut warnings = Vec::new();
        if self.discount_amount > self.subtotal {
            warnings.push(DegenerateResult::DiscountExceedsSubtotal);
        }
        if self.total < Decimal::ZERO {
            warnings.push(DegenerateResult::NegativeTotal);
        }
        if self.margin < Decimal::ZERO {
            warnings.push(DegenerateResult::NegativeMargin);
        }
        warnings
    }

    /// True if [`CalculationResult::warnings`] is non-empty.
    pub fn is_degenerate(&self) -> bool {
        !self.warnings().is_empty()
    }

    /// Converts warnings into an error, for callers that refuse loss-making
    /// or negative quotes.
    pub fn reject_degenerate(self) -> CoreResult<Self> {
        let warnings = self.warnings();
        if warnings.is_empty() {
            Ok(self)
        } else {
            Err(CoreError::Degenerate(warnings))
        }
    }

    /// Presentation copy: money fields rounded to `decimals` places,
    /// `margin_percentage` to two places.
    ///
    /// The rounded copy does not necessarily satisfy
    /// `total == subtotal - discount + tax`; store the unrounded result.
    pub fn rounded(&self, decimals: u32) -> Self {
        CalculationResult {
            subtotal: round_currency(self.subtotal, decimals),
            discount_amount: round_currency(self.discount_amount, decimals),
            taxable_items_total: round_currency(self.taxable_items_total, decimals),
            tax_amount: round_currency(self.tax_amount, decimals),
            total: round_currency(self.total, decimals),
            estimated_cost: round_currency(self.estimated_cost, decimals),
            margin: round_currency(self.margin, decimals),
            margin_percentage: round_currency(self.margin_percentage, PERCENT_DECIMALS),
        }
    }
}

// =============================================================================
// Aggregate Calculation
// =============================================================================

/// Validates the input and computes all quote totals.
///
/// ## Errors
/// - `ValidationError::Negative` for a negative quantity, price, cost,
///   fixed discount or tax rate (field named, e.g. `lineItems[1].unitPrice`)
/// - `ValidationError::OutOfRange` for a discount percent outside 0-100
/// - `ValidationError::TooLarge` if a sum overflows the decimal range
///
/// A negative total or margin is *not* an error; see
/// [`CalculationResult::warnings`].
///
/// ## Example
/// ```rust
/// use haulwise_core::{calculate, CalculationInput, LineItem, LineItemKind};
/// use rust_decimal_macros::dec;
///
/// let input = CalculationInput::new(vec![
///     LineItem::new(LineItemKind::Service, dec!(2), dec!(100))
///         .with_cost(dec!(60))
///         .taxable(true),
///     LineItem::new(LineItemKind::Fee, dec!(1), dec!(50)).with_cost(dec!(20)),
/// ])
/// .with_tax_rate(dec!(10))
/// .with_discount_percent(dec!(10));
///
/// let result = calculate(&input).unwrap();
/// assert_eq!(result.subtotal, dec!(250));
/// assert_eq!(result.discount_amount, dec!(25));
/// assert_eq!(result.tax_amount, dec!(18));
/// assert_eq!(result.total, dec!(243));
/// assert_eq!(result.margin, dec!(103));
/// ```
pub fn calculate(input: &CalculationInput) -> CoreResult<CalculationResult> {
    validate_tax_rate_percent(input.tax_rate_percent)?;
    if let Some(percent) = input.discount_percent {
        validate_discount_percent(percent)?;
    }
    if let Some(amount) = input.discount_amount {
        validate_discount_amount(amount)?;
    }

    // 1. Per-line totals and the three running sums
    let mut subtotal = Decimal::ZERO;
    let mut taxable_items_total = Decimal::ZERO;
    let mut estimated_cost = Decimal::ZERO;

    for (index, item) in input.line_items.iter().enumerate() {
        let prefix = format!("lineItems[{index}].");
        let totals = line_totals_for(&prefix, item.quantity, item.unit_price, item.unit_cost)?;

        subtotal = checked_add(subtotal, totals.line_total, "subtotal")?;
        if item.taxable {
            taxable_items_total =
                checked_add(taxable_items_total, totals.line_total, "taxableItemsTotal")?;
        }
        estimated_cost = checked_add(estimated_cost, totals.line_cost_total, "estimatedCost")?;
    }

    // 2. Discount: a positive percentage always overrides the fixed amount
    let discount_percent = input.discount_percent.unwrap_or(Decimal::ZERO);
    let discount_amount = if discount_percent > Decimal::ZERO {
        subtotal
            .checked_mul(discount_percent)
            .ok_or_else(|| too_large("discountAmount"))?
            / Decimal::ONE_HUNDRED
    } else {
        input.discount_amount.unwrap_or(Decimal::ZERO)
    };

    // 3. Tax on the taxable share of the discounted amount
    let tax_amount = if subtotal.is_zero() {
        Decimal::ZERO
    } else {
        // Multiply before dividing so a full discount leaves exactly zero
        let taxable_discount = discount_amount
            .checked_mul(taxable_items_total)
            .and_then(|scaled| scaled.checked_div(subtotal))
            .ok_or_else(|| too_large("taxAmount"))?;
        let taxable_base = taxable_items_total - taxable_discount;
        taxable_base
            .checked_mul(input.tax_rate_percent)
            .ok_or_else(|| too_large("taxAmount"))?
            / Decimal::ONE_HUNDRED
    };

    // 4. Totals and margin
    let total = (subtotal - discount_amount)
        .checked_add(tax_amount)
        .ok_or_else(|| too_large("total"))?;
    let margin = total
        .checked_sub(estimated_cost)
        .ok_or_else(|| too_large("margin"))?;
    let margin_percentage = if total > Decimal::ZERO {
        margin
            .checked_div(total)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| too_large("marginPercentage"))?
    } else {
        Decimal::ZERO
    };

    let result = CalculationResult {
        subtotal,
        discount_amount,
        taxable_items_total,
        tax_amount,
        total,
        estimated_cost,
        margin,
        margin_percentage,
    };

    debug!(
        items = input.line_items.len(),
        subtotal = %result.subtotal,
        total = %result.total,
        margin = %result.margin,
        "Quote calculated"
    );

    let warnings = result.warnings();
    if !warnings.is_empty() {
        warn!(?warnings, total = %result.total, "Quote calculation is degenerate");
    }

    Ok(result)
}

fn checked_add(acc: Decimal, value: Decimal, field: &str) -> CoreResult<Decimal> {
    acc.checked_add(value).ok_or_else(|| too_large(field))
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
