//! Identity atoms.
//!
//! Sku: ingredient stock-keeping unit
//! IngredientBatchRef: supplier batch reference attached to a SKU
//! ActorId: who performed a write, for audit fields

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fingerprint;

fn validate_field(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            raw: raw.to_string(),
            reason: "empty".to_string(),
        });
    }
    // Fields flow into the canonical fingerprint string, so the separator
    // characters must never appear inside them.
    if raw.contains(fingerprint::RECORD_SEPARATOR) || raw.contains(fingerprint::FIELD_SEPARATOR) {
        return Err(ValidationError::InvalidField {
            field,
            raw: raw.to_string(),
            reason: format!(
                "must not contain `{}` or `{}`",
                fingerprint::RECORD_SEPARATOR,
                fingerprint::FIELD_SEPARATOR
            ),
        });
    }
    Ok(())
}

/// Ingredient SKU - non-empty, delimiter-safe string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        validate_field("sku", &s)?;
        Ok(Self(s.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compose the structured SKU form `<category>_<seq>_<pack_size>`.
    pub fn format(category_code: u32, seq: u32, pack_size_value: u32) -> Self {
        Self(format!("{category_code}_{seq:04}_{pack_size_value}"))
    }

    /// Split a structured SKU back into its parts.
    ///
    /// Accepts the underscore form and the legacy compact form
    /// `<category><seq:4><pack_size>` with a single-digit category.
    pub fn parts(&self) -> Result<SkuParts, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidField {
            field: "sku",
            raw: self.0.clone(),
            reason: reason.to_string(),
        };
        let parse = |part: &str, reason: &'static str| {
            part.parse::<u32>().map_err(|_| invalid(reason))
        };
        if self.0.contains('_') {
            let parts: Vec<&str> = self.0.split('_').collect();
            if parts.len() != 3 {
                return Err(invalid("expected <category>_<seq>_<pack_size>"));
            }
            return Ok(SkuParts {
                category_code: parse(parts[0], "category is not a number")?,
                seq: parse(parts[1], "seq is not a number")?,
                pack_size_value: parse(parts[2], "pack size is not a number")?,
            });
        }
        if self.0.len() < 6 || !self.0.is_ascii() {
            return Err(invalid("too short for the compact form"));
        }
        Ok(SkuParts {
            category_code: parse(&self.0[..1], "category is not a number")?,
            seq: parse(&self.0[1..5], "seq is not a number")?,
            pack_size_value: parse(&self.0[5..], "pack size is not a number")?,
        })
    }
}

/// Decomposed structured SKU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkuParts {
    pub category_code: u32,
    pub seq: u32,
    pub pack_size_value: u32,
}

impl fmt::Debug for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sku({:?})", self.0)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Sku {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Sku::new(s)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> String {
        sku.0
    }
}

/// Supplier batch reference - non-empty, delimiter-safe string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IngredientBatchRef(String);

impl IngredientBatchRef {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        validate_field("ingredient batch code", &s)?;
        Ok(Self(s.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IngredientBatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IngredientBatchRef({:?})", self.0)
    }
}

impl fmt::Display for IngredientBatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IngredientBatchRef {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        IngredientBatchRef::new(s)
    }
}

impl From<IngredientBatchRef> for String {
    fn from(batch: IngredientBatchRef) -> String {
        batch.0
    }
}

/// Actor identifier - non-empty string after trimming.
///
/// Callers name themselves (usually an email); validation only rejects
/// empty/whitespace-only values.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

impl ActorId {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "actor",
                raw: s,
                reason: "empty".to_string(),
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({:?})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ActorId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        ActorId::new(s)
    }
}

impl From<ActorId> for String {
    fn from(id: ActorId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_rejects_empty_and_delimiters() {
        assert!(Sku::new("").is_err());
        assert!(Sku::new("   ").is_err());
        assert!(Sku::new("A|B").is_err());
        assert!(Sku::new("A=B").is_err());
        assert_eq!(Sku::new("  1_0001_25 ").unwrap().as_str(), "1_0001_25");
    }

    #[test]
    fn sku_parts_round_trip() {
        let sku = Sku::format(3, 17, 25);
        assert_eq!(sku.as_str(), "3_0017_25");
        let parts = sku.parts().unwrap();
        assert_eq!(parts.category_code, 3);
        assert_eq!(parts.seq, 17);
        assert_eq!(parts.pack_size_value, 25);
    }

    #[test]
    fn sku_parts_compact_form() {
        let parts = Sku::new("3001725").unwrap().parts().unwrap();
        assert_eq!(parts.category_code, 3);
        assert_eq!(parts.seq, 17);
        assert_eq!(parts.pack_size_value, 25);

        assert!(Sku::new("30017").unwrap().parts().is_err());
        assert!(Sku::new("a_b_c").unwrap().parts().is_err());
    }

    #[test]
    fn actor_id_rejects_empty() {
        assert!(ActorId::new("  ").is_err());
        assert_eq!(ActorId::new("dev@example.com").unwrap().as_str(), "dev@example.com");
    }
}
