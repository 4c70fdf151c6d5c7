//! Shared test fixtures: an in-memory registry with a stocked ingredient
//! catalog and no allocation backoff.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use formulary::config::Config;
use formulary::store::MemoryStore;
use formulary::{ActorId, IngredientBatchRef, Registry, Sku, WeightPercent};

pub fn sku(raw: &str) -> Sku {
    Sku::new(raw).expect("valid sku")
}

pub fn actor() -> ActorId {
    ActorId::new("tester@example.com").expect("valid actor")
}

pub fn wt(raw: &str, percent: f64) -> (Sku, WeightPercent) {
    let sku = sku(raw);
    let wt = WeightPercent::from_f64(&sku, percent).expect("valid weight");
    (sku, wt)
}

pub fn batch(raw: &str, lot: &str) -> (Sku, IngredientBatchRef) {
    (sku(raw), IngredientBatchRef::new(lot).expect("valid batch ref"))
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.allocator.backoff_base_ms = 0;
    config.allocator.backoff_max_ms = 0;
    config
}

/// Registry over a fresh in-memory store with the given SKUs registered.
pub fn registry_with_ingredients(skus: &[&str]) -> (Arc<MemoryStore>, Registry) {
    let store = Arc::new(MemoryStore::new());
    for raw in skus {
        store.register_ingredient(&sku(raw));
    }
    let registry = Registry::new(store.clone(), store.clone(), &test_config());
    (store, registry)
}
