//! Allocation contention surfaced through the registry workflows.

mod fixtures;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use fixtures::{sku, test_config};

use formulary::store::{CounterRow, CounterStore, MemoryStore, StoreError};
use formulary::{OpError, Registry, Transience};

/// Counter store whose compare-and-swap loses a configured number of times
/// before behaving normally, as if other writers kept winning.
struct FlakyCounters {
    inner: Arc<MemoryStore>,
    remaining_losses: AtomicU32,
}

impl FlakyCounters {
    fn new(inner: Arc<MemoryStore>, losses: u32) -> Self {
        Self {
            inner,
            remaining_losses: AtomicU32::new(losses),
        }
    }
}

impl CounterStore for FlakyCounters {
    fn counter(&self, name: &str, scope: &str) -> Result<Option<CounterRow>, StoreError> {
        self.inner.counter(name, scope)
    }

    fn create_counter(
        &self,
        name: &str,
        scope: &str,
        start: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        self.inner.create_counter(name, scope, start, now_ms)
    }

    fn advance_counter(
        &self,
        name: &str,
        scope: &str,
        expected: u64,
        next: u64,
        now_ms: u64,
    ) -> Result<bool, StoreError> {
        let remaining = self.remaining_losses.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_losses.store(remaining - 1, Ordering::SeqCst);
            return Ok(false);
        }
        self.inner.advance_counter(name, scope, expected, next, now_ms)
    }
}

fn registry_with_losses(losses: u32) -> (Arc<MemoryStore>, Registry) {
    let store = Arc::new(MemoryStore::new());
    store.register_ingredient(&sku("X1"));
    let counters = Arc::new(FlakyCounters::new(store.clone(), losses));
    let registry = Registry::new(counters, store.clone(), &test_config());
    (store, registry)
}

#[test]
fn workflow_rides_out_transient_contention() {
    // One full allocator budget (10) plus two more losses: the first workflow
    // round surfaces contention, the re-run succeeds on its third swap.
    let (_, registry) = registry_with_losses(12);
    let (code, created) = registry.get_or_create_set(&[sku("X1")], None).unwrap();
    assert!(created);
    assert_eq!(code.as_str(), "AA");
}

#[test]
fn persistent_contention_is_surfaced_as_retryable() {
    let (_, registry) = registry_with_losses(u32::MAX);
    match registry.get_or_create_set(&[sku("X1")], None) {
        Err(err @ OpError::Contention { .. }) => {
            assert_eq!(err.transience(), Transience::Retryable);
        }
        other => panic!("expected contention, got {other:?}"),
    }
}
