//! # Domain Types
//!
//! Value types the quote and invoice editors hand to the engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌─────────────────────────┐           │
//! │  │      LineItem        │  0..n  │    CalculationInput     │           │
//! │  │  ──────────────────  │◄───────│  ─────────────────────  │           │
//! │  │  kind (LineItemKind) │        │  line_items             │           │
//! │  │  quantity            │        │  tax_rate_percent       │           │
//! │  │  unit_price          │        │  discount_percent?      │           │
//! │  │  unit_cost?          │        │  discount_amount?       │           │
//! │  │  taxable             │        └─────────────────────────┘           │
//! │  │  line_total()   ◄── derived, never stored                           │
//! │  └──────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! The engine owns no state. The caller stores the `CalculationResult`
//! next to the quote version it was computed for.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calculator::{self, CalculationResult, LineTotals};
use crate::error::CoreResult;

// =============================================================================
// Line Item Kind
// =============================================================================

/// What a line item bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    /// Labor or a service (packing, loading, driving).
    #[default]
    Service,
    /// Physical goods (boxes, tape, mattress bags).
    Product,
    /// Flat charges (fuel surcharge, stair fee).
    Fee,
}

impl std::fmt::Display for LineItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItemKind::Service => write!(f, "service"),
            LineItemKind::Product => write!(f, "product"),
            LineItemKind::Fee => write!(f, "fee"),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One priced row within a quote or invoice.
///
/// ## Derived Totals
/// There are no `total` / `cost_total` fields. A serialized line item coming
/// from the web editor may still carry them; serde drops unknown fields, so
/// a stale total can never disagree with `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Document id of the line, if the editor assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,

    /// Display name shown on the quote.
    #[serde(default)]
    pub name: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,

    /// Service, product or fee.
    #[serde(default, rename = "type")]
    pub kind: LineItemKind,

    /// Units billed (hours, boxes, trips). Fractional values are allowed.
    #[ts(as = "String")]
    pub quantity: Decimal,

    /// Price per unit charged to the customer.
    #[ts(as = "String")]
    pub unit_price: Decimal,

    /// Internal cost per unit. Never shown to the customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub unit_cost: Option<Decimal>,

    /// Whether tax applies to this line.
    #[serde(default)]
    pub taxable: bool,
}

impl LineItem {
    /// Creates an unnamed line item.
    ///
    /// ## Example
    /// ```rust
    /// use haulwise_core::{LineItem, LineItemKind};
    /// use rust_decimal_macros::dec;
    ///
    /// let item = LineItem::new(LineItemKind::Service, dec!(3), dec!(120))
    ///     .with_cost(dec!(70))
    ///     .taxable(true);
    /// assert_eq!(item.line_total().unwrap(), dec!(360));
    /// assert_eq!(item.line_cost_total().unwrap(), dec!(210));
    /// ```
    pub fn new(kind: LineItemKind, quantity: Decimal, unit_price: Decimal) -> Self {
        LineItem {
            id: None,
            name: String::new(),
            description: None,
            kind,
            quantity,
            unit_price,
            unit_cost: None,
            taxable: false,
        }
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the internal unit cost.
    pub fn with_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// Sets whether tax applies.
    pub fn taxable(mut self, taxable: bool) -> Self {
        self.taxable = taxable;
        self
    }

    /// Unit cost, defaulting to zero when absent.
    #[inline]
    pub fn unit_cost_or_zero(&self) -> Decimal {
        self.unit_cost.unwrap_or(Decimal::ZERO)
    }

    /// Validated totals for this line (see [`calculator::compute_line_totals`]).
    pub fn totals(&self) -> CoreResult<LineTotals> {
        calculator::compute_line_totals(self.quantity, self.unit_price, self.unit_cost)
    }

    /// `quantity * unit_price`, validated like [`LineItem::totals`].
    pub fn line_total(&self) -> CoreResult<Decimal> {
        Ok(self.totals()?.line_total)
    }

    /// `quantity * unit_cost`, validated like [`LineItem::totals`].
    pub fn line_cost_total(&self) -> CoreResult<Decimal> {
        Ok(self.totals()?.line_cost_total)
    }
}

// =============================================================================
// Calculation Input
// =============================================================================

/// Parameters for one pricing pass.
///
/// ## Discount Precedence
/// `discount_percent` and `discount_amount` are mutually exclusive in the UI.
/// If both arrive, a percentage greater than zero wins and the fixed
/// amount is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInput {
    /// Ordered line items.
    #[serde(default)]
    pub line_items: Vec<LineItem>,

    /// Tax rate as a percentage (8.25 = 8.25%).
    #[serde(default)]
    #[ts(as = "String")]
    pub tax_rate_percent: Decimal,

    /// Percentage discount (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub discount_percent: Option<Decimal>,

    /// Fixed discount in currency units (>= 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub discount_amount: Option<Decimal>,
}

impl CalculationInput {
    /// Creates an input with no tax and no discount.
    pub fn new(line_items: Vec<LineItem>) -> Self {
        CalculationInput {
            line_items,
            ..Default::default()
        }
    }

    /// Sets the tax rate percentage.
    pub fn with_tax_rate(mut self, percent: Decimal) -> Self {
        self.tax_rate_percent = percent;
        self
    }

    /// Sets a percentage discount.
    pub fn with_discount_percent(mut self, percent: Decimal) -> Self {
        self.discount_percent = Some(percent);
        self
    }

    /// Sets a fixed discount amount.
    pub fn with_discount_amount(mut self, amount: Decimal) -> Self {
        self.discount_amount = Some(amount);
        self
    }

    /// Runs [`calculator::calculate`] on this input.
    pub fn calculate(&self) -> CoreResult<CalculationResult> {
        calculator::calculate(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_item_kind_default_and_display() {
        assert_eq!(LineItemKind::default(), LineItemKind::Service);
        assert_eq!(LineItemKind::Fee.to_string(), "fee");
    }

    #[test]
    fn test_unit_cost_defaults_to_zero() {
        let item = LineItem::new(LineItemKind::Product, dec!(4), dec!(3.5));
        assert_eq!(item.unit_cost_or_zero(), Decimal::ZERO);
        assert_eq!(item.line_total().unwrap(), dec!(14.0));
        assert_eq!(item.line_cost_total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let item = LineItem::new(LineItemKind::Product, Decimal::MAX, dec!(2));
        assert!(matches!(
            item.line_total(),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));

        let item = LineItem::new(LineItemKind::Product, dec!(-1), dec!(2));
        assert!(item.line_cost_total().is_err());
    }

    #[test]
    fn test_deserialize_ignores_stale_totals() {
        let json = r#"{
            "id": "li-1",
            "type": "fee",
            "name": "Stair fee",
            "quantity": 2,
            "unitPrice": "35.00",
            "total": 9999,
            "costTotal": 9999,
            "taxable": true
        }"#;

        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, LineItemKind::Fee);
        assert_eq!(item.line_total().unwrap(), dec!(70));
        assert_eq!(item.line_cost_total().unwrap(), Decimal::ZERO);
        assert!(!serde_json::to_string(&item).unwrap().contains("9999"));
    }

    #[test]
    fn test_input_builder() {
        let input = CalculationInput::new(vec![])
            .with_tax_rate(dec!(8.25))
            .with_discount_percent(dec!(10))
            .with_discount_amount(dec!(5));
        assert_eq!(input.tax_rate_percent, dec!(8.25));
        assert_eq!(input.discount_percent, Some(dec!(10)));
        assert_eq!(input.discount_amount, Some(dec!(5)));
    }

    #[test]
    fn test_input_deserialize_defaults() {
        let input: CalculationInput = serde_json::from_str("{}").unwrap();
        assert!(input.line_items.is_empty());
        assert_eq!(input.tax_rate_percent, Decimal::ZERO);
        assert_eq!(input.discount_percent, None);
    }
}
