//! In-memory store backend.
//!
//! Reference semantics for the storage traits: the counter compare-and-swap
//! is atomic under one mutex, entity inserts are conditional on their key.
//! Used by tests and embedded callers; a warehouse-backed implementation must
//! preserve the same conditional-write behavior.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use formulary_core::{BatchCode, Fingerprint, PartnerCode, SetCode, Sku, WeightCode};

use super::{
    BatchVariantRow, CounterRow, CounterStore, LocationRow, PartnerRow, RegistryStore, SetRow,
    StoreError, WeightVariantRow,
};

#[derive(Default)]
struct Inner {
    counters: BTreeMap<(String, String), CounterRow>,
    ingredients: BTreeSet<String>,
    sets: BTreeMap<String, SetRow>,
    weights: BTreeMap<(String, String), WeightVariantRow>,
    batches: BTreeMap<(String, String, String), BatchVariantRow>,
    partners: BTreeMap<String, PartnerRow>,
    locations: BTreeMap<String, LocationRow>,
}

/// Mutex-guarded maps behind both storage traits.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a panicking test thread; the data is
        // still structurally sound.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a SKU in the ingredient catalog.
    pub fn register_ingredient(&self, sku: &Sku) {
        self.lock().ingredients.insert(sku.as_str().to_string());
    }
}

impl CounterStore for MemoryStore {
    fn counter(&self, name: &str, scope: &str) -> Result<Option<CounterRow>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .counters
            .get(&(name.to_string(), scope.to_string()))
            .cloned())
    }

    fn create_counter(
        &self,
        name: &str,
        scope: &str,
        start: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let key = (name.to_string(), scope.to_string());
        if inner.counters.contains_key(&key) {
            return Ok(false);
        }
        inner.counters.insert(
            key,
            CounterRow {
                counter_name: name.to_string(),
                scope: scope.to_string(),
                next_value: start,
                updated_at_ms: now_ms,
            },
        );
        Ok(true)
    }

    fn advance_counter(
        &self,
        name: &str,
        scope: &str,
        expected: u64,
        next: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let key = (name.to_string(), scope.to_string());
        match inner.counters.get_mut(&key) {
            Some(row) if row.next_value == expected => {
                row.next_value = next;
                row.updated_at_ms = now_ms;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl RegistryStore for MemoryStore {
    fn ingredient_exists(&self, sku: &Sku) -> Result<bool, StoreError> {
        Ok(self.lock().ingredients.contains(sku.as_str()))
    }

    fn set_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<SetCode>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sets
            .get(fingerprint.as_str())
            .map(|row| row.set_code.clone()))
    }

    fn insert_set(&self, row: SetRow) -> Result<Option<SetCode>, StoreError> {
        let mut inner = self.lock();
        let key = row.fingerprint.as_str().to_string();
        if let Some(existing) = inner.sets.get(&key) {
            return Ok(Some(existing.set_code.clone()));
        }
        inner.sets.insert(key, row);
        Ok(None)
    }

    fn weight_by_fingerprint(
        &self,
        set_code: &SetCode,
        fingerprint: &Fingerprint,
    ) -> Result<Option<WeightCode>, StoreError> {
        let inner = self.lock();
        let key = (
            set_code.as_str().to_string(),
            fingerprint.as_str().to_string(),
        );
        Ok(inner.weights.get(&key).map(|row| row.weight_code.clone()))
    }

    fn insert_weight_variant(
        &self,
        row: WeightVariantRow,
    ) -> Result<Option<WeightCode>, StoreError> {
        let mut inner = self.lock();
        let key = (
            row.set_code.as_str().to_string(),
            row.fingerprint.as_str().to_string(),
        );
        if let Some(existing) = inner.weights.get(&key) {
            return Ok(Some(existing.weight_code.clone()));
        }
        inner.weights.insert(key, row);
        Ok(None)
    }

    fn batch_by_fingerprint(
        &self,
        set_code: &SetCode,
        weight_code: &WeightCode,
        fingerprint: &Fingerprint,
    ) -> Result<Option<BatchCode>, StoreError> {
        let inner = self.lock();
        let key = (
            set_code.as_str().to_string(),
            weight_code.as_str().to_string(),
            fingerprint.as_str().to_string(),
        );
        Ok(inner.batches.get(&key).map(|row| row.batch_code.clone()))
    }

    fn insert_batch_variant(
        &self,
        row: BatchVariantRow,
    ) -> Result<Option<BatchCode>, StoreError> {
        let mut inner = self.lock();
        let key = (
            row.set_code.as_str().to_string(),
            row.weight_code.as_str().to_string(),
            row.fingerprint.as_str().to_string(),
        );
        if let Some(existing) = inner.batches.get(&key) {
            return Ok(Some(existing.batch_code.clone()));
        }
        inner.batches.insert(key, row);
        Ok(None)
    }

    fn partner(&self, code: &PartnerCode) -> Result<Option<PartnerRow>, StoreError> {
        Ok(self.lock().partners.get(code.as_str()).cloned())
    }

    fn partners(&self) -> Result<Vec<PartnerRow>, StoreError> {
        Ok(self.lock().partners.values().cloned().collect())
    }

    fn insert_partner(&self, row: PartnerRow) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let key = row.partner_code.as_str().to_string();
        if inner.partners.contains_key(&key) {
            return Ok(false);
        }
        inner.partners.insert(key, row);
        Ok(true)
    }

    fn formulation_exists(
        &self,
        set_code: &SetCode,
        weight_code: &WeightCode,
        batch_code: &BatchCode,
    ) -> Result<bool, StoreError> {
        let inner = self.lock();
        Ok(inner.batches.values().any(|row| {
            row.set_code == *set_code
                && row.weight_code == *weight_code
                && row.batch_code == *batch_code
        }))
    }

    fn location(&self, location_id: &str) -> Result<Option<LocationRow>, StoreError> {
        Ok(self.lock().locations.get(location_id).cloned())
    }

    fn insert_location(&self, row: LocationRow) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        if inner.locations.contains_key(&row.location_id) {
            return Ok(false);
        }
        inner.locations.insert(row.location_id.clone(), row);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_create_is_conditional() {
        let store = MemoryStore::new();
        assert!(store.create_counter("set_code", "", 1, 10).unwrap());
        assert!(!store.create_counter("set_code", "", 5, 20).unwrap());
        let row = store.counter("set_code", "").unwrap().unwrap();
        assert_eq!(row.next_value, 1);
        assert_eq!(row.updated_at_ms, 10);
    }

    #[test]
    fn advance_requires_matching_expected_value() {
        let store = MemoryStore::new();
        store.create_counter("set_code", "", 1, 0).unwrap();

        assert!(store.advance_counter("set_code", "", 1, 2, 5).unwrap());
        // Stale expectation loses.
        assert!(!store.advance_counter("set_code", "", 1, 2, 6).unwrap());
        assert!(store.advance_counter("set_code", "", 2, 3, 7).unwrap());

        let row = store.counter("set_code", "").unwrap().unwrap();
        assert_eq!(row.next_value, 3);
        assert_eq!(row.updated_at_ms, 7);
    }

    #[test]
    fn advance_on_missing_row_is_a_miss() {
        let store = MemoryStore::new();
        assert!(!store.advance_counter("set_code", "", 1, 2, 0).unwrap());
    }

    #[test]
    fn counters_are_scoped_independently() {
        let store = MemoryStore::new();
        store.create_counter("weight_code", "AA", 1, 0).unwrap();
        store.create_counter("weight_code", "AB", 1, 0).unwrap();
        assert!(store.advance_counter("weight_code", "AA", 1, 2, 0).unwrap());
        let untouched = store.counter("weight_code", "AB").unwrap().unwrap();
        assert_eq!(untouched.next_value, 1);
    }
}
