//! # Validation Module
//!
//! Input validation for pricing inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Quote editor (TypeScript)                                    │
//! │  ├── Basic format checks (empty, numeric)                              │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: haulwise-core (Rust)                                         │
//! │  ├── Type validation (deserialization into Decimal)                    │
//! │  └── THIS MODULE: sign/range rules, f64 finiteness                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: calculator.rs                                                │
//! │  └── Overflow checks during aggregation                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are never clamped: a bad value is always reported with its field.
//!
//! ## Usage
//! ```rust
//! use haulwise_core::validation::{validate_discount_percent, validate_non_negative};
//! use rust_decimal_macros::dec;
//!
//! assert!(validate_non_negative("quantity", dec!(2)).is_ok());
//! assert!(validate_discount_percent(dec!(150)).is_err());
//! ```

use rust_decimal::prelude::*;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted discount percentage.
pub const MAX_DISCOUNT_PERCENT: Decimal = Decimal::ONE_HUNDRED;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects negative values.
///
/// ## Rules
/// - Zero is allowed (free items, zero-rated tax)
/// - Negative values are a caller error, not clamped
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount percentage.
///
/// ## Rules
/// - Must be between 0 and 100 inclusive
pub fn validate_discount_percent(percent: Decimal) -> ValidationResult<()> {
    if percent < Decimal::ZERO || percent > MAX_DISCOUNT_PERCENT {
        return Err(ValidationError::OutOfRange {
            field: "discountPercent".to_string(),
            min: "0".to_string(),
            max: MAX_DISCOUNT_PERCENT.to_string(),
        });
    }

    Ok(())
}

/// Validates a fixed discount amount (must be >= 0).
pub fn validate_discount_amount(amount: Decimal) -> ValidationResult<()> {
    validate_non_negative("discountAmount", amount)
}

/// Validates a tax rate percentage (must be >= 0).
///
/// No upper bound: some jurisdictions stack levies past 100% on
/// specific goods, and the engine has no reason to refuse them.
pub fn validate_tax_rate_percent(rate: Decimal) -> ValidationResult<()> {
    validate_non_negative("taxRatePercent", rate)
}

// =============================================================================
// f64 Boundary
// =============================================================================

/// Converts an `f64` (e.g. a formula result) into a `Decimal`.
///
/// ## Rules
/// - NaN and ±infinity are rejected with `NotFinite`
/// - Values outside the decimal range are rejected with `TooLarge`
///
/// ## Example
/// ```rust
/// use haulwise_core::validation::decimal_from_f64;
///
/// assert!(decimal_from_f64("volume", 216.0).is_ok());
/// assert!(decimal_from_f64("volume", f64::NAN).is_err());
/// ```
pub fn decimal_from_f64(field: &str, value: f64) -> ValidationResult<Decimal> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    Decimal::from_f64(value).ok_or_else(|| ValidationError::TooLarge {
        field: field.to_string(),
    })
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Returns true if `name` is a formula identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates that a field name can be referenced from formulas.
pub fn validate_identifier(field: &str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !is_identifier(name) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must start with a letter or underscore and contain only letters, digits and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("quantity", dec!(0)).is_ok());
        assert!(validate_non_negative("quantity", dec!(-0)).is_ok());
        assert!(validate_non_negative("quantity", dec!(2.5)).is_ok());

        let err = validate_non_negative("quantity", dec!(-1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: "quantity".to_string()
            }
        );
    }

    #[test]
    fn test_validate_discount_percent() {
        assert!(validate_discount_percent(dec!(0)).is_ok());
        assert!(validate_discount_percent(dec!(12.5)).is_ok());
        assert!(validate_discount_percent(dec!(100)).is_ok());

        assert!(validate_discount_percent(dec!(-0.01)).is_err());
        assert!(validate_discount_percent(dec!(100.01)).is_err());
    }

    #[test]
    fn test_validate_tax_rate_percent() {
        assert!(validate_tax_rate_percent(dec!(0)).is_ok());
        assert!(validate_tax_rate_percent(dec!(8.25)).is_ok());
        assert!(validate_tax_rate_percent(dec!(-1)).is_err());
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64("v", 2.5).unwrap(), dec!(2.5));
        assert!(matches!(
            decimal_from_f64("v", f64::INFINITY),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            decimal_from_f64("v", f64::NAN),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            decimal_from_f64("v", 1e300),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("rooms"));
        assert!(is_identifier("_tmp"));
        assert!(is_identifier("rate2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2rate"));
        assert!(!is_identifier("rate-2"));
        assert!(!is_identifier("has space"));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("outputField", "estimatedVolume").is_ok());
        assert!(matches!(
            validate_identifier("outputField", "  "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_identifier("outputField", "estimated volume"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }
}
