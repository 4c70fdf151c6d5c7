//! Storage seams for counters and composite-entity rows.
//!
//! The traits expose exactly the primitives the backing warehouse offers:
//! single-row reads, conditional inserts, and a single-row compare-and-swap.
//! No multi-row transactions are assumed anywhere above this layer.

mod memory;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use formulary_core::{
    ActorId, BatchCode, Effect, Fingerprint, IngredientBatchRef, PartnerCode, SetCode, Sku,
    Transience, WeightCode, WeightPercent,
};

pub use memory::MemoryStore;

/// Wall-clock epoch milliseconds for `updated_at`/`created_at` fields.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Backend failure surfaced by a store implementation.
#[derive(Debug, Error)]
#[error("store backend error: {reason}")]
pub struct StoreError {
    pub reason: String,
}

impl StoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn transience(&self) -> Transience {
        Transience::Unknown
    }

    pub fn effect(&self) -> Effect {
        Effect::Unknown
    }
}

/// One durable counter row per `(counter_name, scope)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRow {
    pub counter_name: String,
    pub scope: String,
    pub next_value: u64,
    pub updated_at_ms: u64,
}

/// The warehouse's concurrency primitives, one row at a time.
///
/// `advance_counter` must be a true atomic single-row compare-and-swap: the
/// no-duplicate-allocations guarantee of the whole system rests on it.
pub trait CounterStore: Send + Sync {
    fn counter(&self, name: &str, scope: &str) -> Result<Option<CounterRow>, StoreError>;

    /// Conditional insert. Returns `false` when the row already exists.
    fn create_counter(
        &self,
        name: &str,
        scope: &str,
        start: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError>;

    /// Conditional update: set `next_value = next` only where the stored
    /// value still equals `expected`. Returns `false` when another writer
    /// advanced the counter first.
    fn advance_counter(
        &self,
        name: &str,
        scope: &str,
        expected: u64,
        next: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError>;
}

/// One member of a dry-weight split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightItem {
    pub sku: Sku,
    pub wt_percent: WeightPercent,
}

/// One member of a batch combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub sku: Sku,
    pub ingredient_batch_code: IngredientBatchRef,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRow {
    pub set_code: SetCode,
    pub fingerprint: Fingerprint,
    pub skus: Vec<Sku>,
    pub created_at_ms: u64,
    pub created_by: Option<ActorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightVariantRow {
    pub set_code: SetCode,
    pub weight_code: WeightCode,
    pub fingerprint: Fingerprint,
    pub items: Vec<WeightItem>,
    pub created_at_ms: u64,
    pub created_by: Option<ActorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchVariantRow {
    pub set_code: SetCode,
    pub weight_code: WeightCode,
    pub batch_code: BatchCode,
    pub fingerprint: Fingerprint,
    pub items: Vec<BatchItem>,
    pub created_at_ms: u64,
    pub created_by: Option<ActorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRow {
    pub partner_code: PartnerCode,
    pub partner_name: String,
    pub machine_specification: String,
    pub created_at_ms: u64,
    pub created_by: Option<ActorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Full formatted id, `"SS WW BB PP YYMMDD"`.
    pub location_id: String,
    pub set_code: SetCode,
    pub weight_code: WeightCode,
    pub batch_code: BatchCode,
    pub partner_code: PartnerCode,
    /// ISO `YYYY-MM-DD` as submitted.
    pub production_date: String,
    pub created_at_ms: u64,
    pub created_by: Option<ActorId>,
}

/// Entity persistence. All rows are append-only; inserts keyed by fingerprint
/// are conditional and report a pre-existing code instead of overwriting.
pub trait RegistryStore: Send + Sync {
    fn ingredient_exists(&self, sku: &Sku) -> Result<bool, StoreError>;

    fn set_by_fingerprint(&self, fingerprint: &Fingerprint)
        -> Result<Option<SetCode>, StoreError>;

    /// Returns the existing code when a row with this fingerprint already
    /// exists (the narrow lookup/persist race window).
    fn insert_set(&self, row: SetRow) -> Result<Option<SetCode>, StoreError>;

    fn weight_by_fingerprint(
        &self,
        set_code: &SetCode,
        fingerprint: &Fingerprint,
    ) -> Result<Option<WeightCode>, StoreError>;

    fn insert_weight_variant(&self, row: WeightVariantRow)
        -> Result<Option<WeightCode>, StoreError>;

    fn batch_by_fingerprint(
        &self,
        set_code: &SetCode,
        weight_code: &WeightCode,
        fingerprint: &Fingerprint,
    ) -> Result<Option<BatchCode>, StoreError>;

    fn insert_batch_variant(&self, row: BatchVariantRow)
        -> Result<Option<BatchCode>, StoreError>;

    fn partner(&self, code: &PartnerCode) -> Result<Option<PartnerRow>, StoreError>;

    fn partners(&self) -> Result<Vec<PartnerRow>, StoreError>;

    /// Conditional insert keyed by partner code; returns `false` on conflict.
    fn insert_partner(&self, row: PartnerRow) -> Result<bool, StoreError>;

    fn formulation_exists(
        &self,
        set_code: &SetCode,
        weight_code: &WeightCode,
        batch_code: &BatchCode,
    ) -> Result<bool, StoreError>;

    fn location(&self, location_id: &str) -> Result<Option<LocationRow>, StoreError>;

    /// Conditional insert keyed by the full location id; returns `false` on
    /// conflict.
    fn insert_location(&self, row: LocationRow) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip_through_json() {
        let skus = vec![Sku::new("X1").unwrap(), Sku::new("X2").unwrap()];
        let row = SetRow {
            set_code: SetCode::parse("AA").unwrap(),
            fingerprint: Fingerprint::of_set(&skus),
            skus,
            created_at_ms: 1_726_000_000_000,
            created_by: Some(ActorId::new("dev@example.com").unwrap()),
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: SetRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);

        let counter = CounterRow {
            counter_name: "set_code".to_string(),
            scope: String::new(),
            next_value: 3,
            updated_at_ms: 1_726_000_000_000,
        };
        let json = serde_json::to_string(&counter).unwrap();
        assert_eq!(serde_json::from_str::<CounterRow>(&json).unwrap(), counter);
    }

    #[test]
    fn row_json_rejects_malformed_codes() {
        let raw = r#"{"counter_name":"set_code","scope":"","next_value":1,"updated_at_ms":0}"#;
        assert!(serde_json::from_str::<CounterRow>(raw).is_ok());

        let bad_set = r#"{"set_code":"a1","fingerprint":"x","skus":[],"created_at_ms":0,"created_by":null}"#;
        assert!(serde_json::from_str::<SetRow>(bad_set).is_err());
    }
}
