//! Dry-weight percentages at fixed precision.
//!
//! Weights are stored as integer hundredths of a percent. The two-decimal
//! precision is part of the dedup contract: submissions that differ only
//! below it fingerprint identically and resolve to the same code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::Sku;

/// Decimal places retained when rounding submitted weight values.
pub const WEIGHT_PRECISION: u32 = 2;

const HUNDRED_PERCENT_HUNDREDTHS: u64 = 10_000;

/// A weight percentage in `[0, 100]`, held as hundredths of a percent.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightPercent(u64);

impl WeightPercent {
    /// Round a submitted value half-up to two decimals.
    pub fn from_f64(sku: &Sku, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 || value > 100.0 {
            return Err(ValidationError::InvalidWeight {
                sku: sku.to_string(),
                raw: value.to_string(),
            });
        }
        Ok(Self((value * 100.0).round() as u64))
    }

    pub fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    pub fn hundredths(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for WeightPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeightPercent({self})")
    }
}

impl fmt::Display for WeightPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Check that rounded weights sum to exactly 100.00.
pub fn validate_weight_sum(items: &[(Sku, WeightPercent)]) -> Result<(), ValidationError> {
    let total: u64 = items.iter().map(|(_, wt)| wt.hundredths()).sum();
    if total != HUNDRED_PERCENT_HUNDREDTHS {
        return Err(ValidationError::WeightSum {
            total: WeightPercent::from_hundredths(total).to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    #[test]
    fn rounding_is_half_up_at_two_decimals() {
        let s = sku("X1");
        assert_eq!(WeightPercent::from_f64(&s, 40.0).unwrap().hundredths(), 4_000);
        assert_eq!(WeightPercent::from_f64(&s, 40.001).unwrap().hundredths(), 4_000);
        assert_eq!(WeightPercent::from_f64(&s, 40.006).unwrap().hundredths(), 4_001);
        assert_eq!(WeightPercent::from_f64(&s, 33.33).unwrap().hundredths(), 3_333);
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let s = sku("X1");
        for bad in [-0.01, 100.01, f64::NAN, f64::INFINITY] {
            assert!(WeightPercent::from_f64(&s, bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn display_is_fixed_two_decimals() {
        assert_eq!(WeightPercent::from_hundredths(4_000).to_string(), "40.00");
        assert_eq!(WeightPercent::from_hundredths(5).to_string(), "0.05");
        assert_eq!(WeightPercent::from_hundredths(10_000).to_string(), "100.00");
    }

    #[test]
    fn sum_must_be_exactly_one_hundred() {
        let items = vec![
            (sku("A"), WeightPercent::from_hundredths(4_000)),
            (sku("B"), WeightPercent::from_hundredths(6_000)),
        ];
        assert!(validate_weight_sum(&items).is_ok());

        let short = vec![
            (sku("A"), WeightPercent::from_hundredths(4_000)),
            (sku("B"), WeightPercent::from_hundredths(5_999)),
        ];
        match validate_weight_sum(&short) {
            Err(ValidationError::WeightSum { total }) => assert_eq!(total, "99.99"),
            other => panic!("expected weight sum failure, got {other:?}"),
        }
    }
}
