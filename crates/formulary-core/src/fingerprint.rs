//! Order-independent content fingerprints for composite entities.
//!
//! Member records are sorted by SKU, serialized in a fixed field order into a
//! delimiter-safe canonical string, and hashed with SHA-256. Two submissions
//! that are set-equal and value-equal (to the declared rounding precision)
//! fingerprint identically regardless of order.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::identity::{IngredientBatchRef, Sku};
use crate::weight::WeightPercent;

/// Joins per-record canonical strings. Rejected inside field values by
/// identity validation.
pub const RECORD_SEPARATOR: char = '|';

/// Joins key and value within one record.
pub const FIELD_SEPARATOR: char = '=';

/// A lower-hex SHA-256 digest of a canonical member string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a set of SKUs: the canonical string is the sorted SKU list.
    pub fn of_set(skus: &[Sku]) -> Self {
        let mut sorted: Vec<&str> = skus.iter().map(Sku::as_str).collect();
        sorted.sort_unstable();
        Self::digest(&sorted.join(&RECORD_SEPARATOR.to_string()))
    }

    /// Fingerprint a dry-weight split: `sku=WW.WW` records, weights at the
    /// fixed two-decimal precision.
    pub fn of_weights(items: &[(Sku, WeightPercent)]) -> Self {
        let mut sorted: Vec<&(Sku, WeightPercent)> = items.iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let parts: Vec<String> = sorted
            .iter()
            .map(|(sku, wt)| format!("{sku}{FIELD_SEPARATOR}{wt}"))
            .collect();
        Self::digest(&parts.join(&RECORD_SEPARATOR.to_string()))
    }

    /// Fingerprint a batch combination: `sku=ingredient_batch_code` records.
    pub fn of_batches(items: &[(Sku, IngredientBatchRef)]) -> Self {
        let mut sorted: Vec<&(Sku, IngredientBatchRef)> = items.iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let parts: Vec<String> = sorted
            .iter()
            .map(|(sku, batch)| format!("{sku}{FIELD_SEPARATOR}{batch}"))
            .collect();
        Self::digest(&parts.join(&RECORD_SEPARATOR.to_string()))
    }

    fn digest(canonical: &str) -> Self {
        use fmt::Write;

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let bytes = hasher.finalize();
        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            // writing into a String cannot fail
            let _ = write!(hex, "{b:02x}");
        }
        Self(hex)
    }

    /// Validate a stored digest string (64 lower-hex characters).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let ok = raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase());
        if !ok {
            return Err(ValidationError::InvalidField {
                field: "fingerprint",
                raw: raw.to_string(),
                reason: "expected 64 lower-hex characters".to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log fields.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Fingerprint::parse(&s)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> String {
        fp.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    fn wt(sku_raw: &str, value: f64) -> (Sku, WeightPercent) {
        let s = sku(sku_raw);
        let w = WeightPercent::from_f64(&s, value).unwrap();
        (s, w)
    }

    #[test]
    fn set_fingerprint_is_order_independent() {
        let forward = Fingerprint::of_set(&[sku("X1"), sku("X2")]);
        let reversed = Fingerprint::of_set(&[sku("X2"), sku("X1")]);
        assert_eq!(forward, reversed);
        assert_ne!(forward, Fingerprint::of_set(&[sku("X1"), sku("X3")]));
    }

    #[test]
    fn weight_fingerprint_is_order_independent() {
        let forward = Fingerprint::of_weights(&[wt("A", 40.0), wt("B", 60.0)]);
        let reversed = Fingerprint::of_weights(&[wt("B", 60.0), wt("A", 40.0)]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn weight_fingerprint_respects_rounding_precision() {
        let base = Fingerprint::of_weights(&[wt("A", 40.00), wt("B", 60.0)]);
        let below_precision = Fingerprint::of_weights(&[wt("A", 40.001), wt("B", 60.0)]);
        let above_precision = Fingerprint::of_weights(&[wt("A", 40.01), wt("B", 60.0)]);
        assert_eq!(base, below_precision);
        assert_ne!(base, above_precision);
    }

    #[test]
    fn batch_fingerprint_tracks_batch_refs() {
        let batch = |s: &str, b: &str| (sku(s), IngredientBatchRef::new(b).unwrap());
        let forward = Fingerprint::of_batches(&[batch("A", "LOT-1"), batch("B", "LOT-2")]);
        let reversed = Fingerprint::of_batches(&[batch("B", "LOT-2"), batch("A", "LOT-1")]);
        assert_eq!(forward, reversed);
        assert_ne!(
            forward,
            Fingerprint::of_batches(&[batch("A", "LOT-1"), batch("B", "LOT-3")])
        );
    }

    #[test]
    fn parse_rejects_non_digests() {
        assert!(Fingerprint::parse("abc").is_err());
        assert!(Fingerprint::parse(&"Z".repeat(64)).is_err());
        let fp = Fingerprint::of_set(&[sku("X1")]);
        assert_eq!(Fingerprint::parse(fp.as_str()).unwrap(), fp);
    }
}
