//! # Estimates Module
//!
//! The built-in estimate formulas the quote wizard offers before a
//! salesperson enters real line items.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  packed_volume(rooms)          rooms × avg_room_size_sqft × packing_factor
//! │  moving_cost(volume, distance) base_rate + volume × rate_per_cubic_foot
//! │                                          + distance × rate_per_mile
//! │  labor_cost(hours, workers)    hours × workers × hourly_rate
//! │  storage_cost(cubic_feet, m)   cubic_feet × months × storage_rate
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coefficients come from [`EstimateCoefficients`], normally loaded as part
//! of the tenant's `PricingConfig`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::validation::validate_non_negative;

/// Coefficients for the built-in estimate formulas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateCoefficients {
    /// Average room size in square feet.
    #[serde(default = "default_avg_room_size_sqft")]
    pub avg_room_size_sqft: Decimal,
    /// Multiplier from floor area to packed cubic feet.
    #[serde(default = "default_packing_factor")]
    pub packing_factor: Decimal,
    /// Flat fee added to every move.
    #[serde(default = "default_base_rate")]
    pub base_rate: Decimal,
    /// Charge per packed cubic foot.
    #[serde(default = "default_rate_per_cubic_foot")]
    pub rate_per_cubic_foot: Decimal,
    /// Charge per mile driven.
    #[serde(default = "default_rate_per_mile")]
    pub rate_per_mile: Decimal,
    /// Charge per worker-hour.
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: Decimal,
    /// Monthly storage charge per cubic foot.
    #[serde(default = "default_storage_rate_per_cubic_foot")]
    pub storage_rate_per_cubic_foot: Decimal,
}

fn default_avg_room_size_sqft() -> Decimal {
    dec!(150)
}

fn default_packing_factor() -> Decimal {
    dec!(1.2)
}

fn default_base_rate() -> Decimal {
    dec!(200)
}

fn default_rate_per_cubic_foot() -> Decimal {
    dec!(0.5)
}

fn default_rate_per_mile() -> Decimal {
    dec!(2.0)
}

fn default_hourly_rate() -> Decimal {
    dec!(50)
}

fn default_storage_rate_per_cubic_foot() -> Decimal {
    dec!(0.75)
}

impl Default for EstimateCoefficients {
    fn default() -> Self {
        EstimateCoefficients {
            avg_room_size_sqft: default_avg_room_size_sqft(),
            packing_factor: default_packing_factor(),
            base_rate: default_base_rate(),
            rate_per_cubic_foot: default_rate_per_cubic_foot(),
            rate_per_mile: default_rate_per_mile(),
            hourly_rate: default_hourly_rate(),
            storage_rate_per_cubic_foot: default_storage_rate_per_cubic_foot(),
        }
    }
}

impl EstimateCoefficients {
    /// Rejects negative coefficients. Field names are prefixed with `estimates.`.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("estimates.avg_room_size_sqft", self.avg_room_size_sqft),
            ("estimates.packing_factor", self.packing_factor),
            ("estimates.base_rate", self.base_rate),
            ("estimates.rate_per_cubic_foot", self.rate_per_cubic_foot),
            ("estimates.rate_per_mile", self.rate_per_mile),
            ("estimates.hourly_rate", self.hourly_rate),
            (
                "estimates.storage_rate_per_cubic_foot",
                self.storage_rate_per_cubic_foot,
            ),
        ];
        for (field, value) in fields {
            validate_non_negative(field, value)?;
        }
        Ok(())
    }

    /// Packed volume in cubic feet for a number of rooms.
    ///
    /// ## Example
    /// ```rust
    /// use haulwise_core::estimates::EstimateCoefficients;
    /// use rust_decimal_macros::dec;
    ///
    /// let coefficients = EstimateCoefficients::default();
    /// assert_eq!(coefficients.packed_volume(dec!(3)).unwrap(), dec!(540));
    /// ```
    pub fn packed_volume(&self, rooms: Decimal) -> CoreResult<Decimal> {
        validate_non_negative("rooms", rooms)?;
        product("volume", &[rooms, self.avg_room_size_sqft, self.packing_factor])
    }

    /// Transport cost for a packed volume over a distance in miles.
    pub fn moving_cost(&self, volume: Decimal, distance: Decimal) -> CoreResult<Decimal> {
        validate_non_negative("volume", volume)?;
        validate_non_negative("distance", distance)?;

        let by_volume = product("movingCost", &[volume, self.rate_per_cubic_foot])?;
        let by_distance = product("movingCost", &[distance, self.rate_per_mile])?;
        self.base_rate
            .checked_add(by_volume)
            .and_then(|sum| sum.checked_add(by_distance))
            .ok_or_else(|| too_large("movingCost").into())
    }

    /// Labor cost for a crew.
    pub fn labor_cost(&self, hours: Decimal, workers: Decimal) -> CoreResult<Decimal> {
        validate_non_negative("hours", hours)?;
        validate_non_negative("workers", workers)?;
        product("laborCost", &[hours, workers, self.hourly_rate])
    }

    /// Storage cost for a volume held for a number of months.
    pub fn storage_cost(&self, cubic_feet: Decimal, months: Decimal) -> CoreResult<Decimal> {
        validate_non_negative("cubicFeet", cubic_feet)?;
        validate_non_negative("months", months)?;
        product(
            "storageCost",
            &[cubic_feet, months, self.storage_rate_per_cubic_foot],
        )
    }
}

fn product(field: &str, factors: &[Decimal]) -> CoreResult<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, factor| acc.checked_mul(*factor))
        .ok_or_else(|| too_large(field).into())
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use rstest::rstest;

    #[rstest]
    #[case(dec!(0), dec!(0))]
    #[case(dec!(1), dec!(180))]
    #[case(dec!(3), dec!(540))]
    #[case(dec!(2.5), dec!(450))]
    fn test_packed_volume(#[case] rooms: Decimal, #[case] expected: Decimal) {
        let c = EstimateCoefficients::default();
        assert_eq!(c.packed_volume(rooms).unwrap(), expected);
    }

    #[test]
    fn test_moving_cost() {
        let c = EstimateCoefficients::default();
        // 200 + 540 * 0.5 + 30 * 2
        assert_eq!(c.moving_cost(dec!(540), dec!(30)).unwrap(), dec!(530));
        assert_eq!(c.moving_cost(dec!(0), dec!(0)).unwrap(), dec!(200));
    }

    #[test]
    fn test_labor_and_storage() {
        let c = EstimateCoefficients::default();
        assert_eq!(c.labor_cost(dec!(4), dec!(3)).unwrap(), dec!(600));
        assert_eq!(c.storage_cost(dec!(540), dec!(2)).unwrap(), dec!(810));
    }

    #[test]
    fn test_custom_coefficients() {
        let c = EstimateCoefficients {
            hourly_rate: dec!(65),
            ..Default::default()
        };
        assert_eq!(c.labor_cost(dec!(2), dec!(2)).unwrap(), dec!(260));
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let c = EstimateCoefficients::default();
        let err = c.labor_cost(dec!(-1), dec!(2)).unwrap_err();
        match err {
            CoreError::Validation(ValidationError::Negative { field }) => {
                assert_eq!(field, "hours")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(c.packed_volume(dec!(-3)).is_err());
        assert!(c.moving_cost(dec!(10), dec!(-1)).is_err());
        assert!(c.storage_cost(dec!(10), dec!(-1)).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let c = EstimateCoefficients::default();
        assert!(matches!(
            c.packed_volume(Decimal::MAX),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(EstimateCoefficients::default().validate().is_ok());

        let bad = EstimateCoefficients {
            rate_per_mile: dec!(-2),
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(CoreError::Validation(ValidationError::Negative { field }))
                if field == "estimates.rate_per_mile"
        ));
    }
}
