//! Optimistic-concurrency code allocation.
//!
//! The backing store offers no sequences, row locks, or transactions, only a
//! single-row conditional update. Reserving the next integer is therefore a
//! compare-and-swap loop: read, compute, conditionally write, retry on a lost
//! race with jittered backoff. For a fixed `(counter_name, scope)` the
//! allocated values are strictly increasing and never repeated.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use formulary_core::{capacity, Code, CounterExhausted};

use crate::error::OpError;
use crate::store::{now_ms, CounterStore};

/// A named counter family: which counter, where its sequence starts, and how
/// wide its codes are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterFamily {
    pub name: String,
    pub start: u64,
    pub width: usize,
}

impl CounterFamily {
    pub fn new(name: impl Into<String>, start: u64, width: usize) -> Self {
        Self {
            name: name.into(),
            start,
            width,
        }
    }
}

/// Bounded retry budget with exponential, jittered backoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base: Duration::from_millis(5),
            backoff_max: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts. For tests and embedded stores where
    /// contention resolves immediately.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        if self.backoff_base.is_zero() {
            return Duration::ZERO;
        }
        let exp = self
            .backoff_base
            .saturating_mul(1u32 << attempt.min(10))
            .min(self.backoff_max);
        let jitter_ms = rand::thread_rng().gen_range(0..=self.backoff_base.as_millis() as u64);
        exp + Duration::from_millis(jitter_ms)
    }
}

/// Reserves counter values through the compare-and-swap loop and formats them
/// as letter codes.
pub struct Allocator {
    store: Arc<dyn CounterStore>,
    retry: RetryPolicy,
}

impl Allocator {
    pub fn new(store: Arc<dyn CounterStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Reserve the next integer for `(family.name, scope)` and return its
    /// formatted code.
    pub fn allocate(&self, family: &CounterFamily, scope: &str) -> Result<Code, OpError> {
        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                std::thread::sleep(self.retry.backoff(attempt - 1));
            }

            let current = match self.store.counter(&family.name, scope)? {
                Some(row) => row.next_value,
                None => {
                    if self
                        .store
                        .create_counter(&family.name, scope, family.start, now_ms())?
                    {
                        family.start
                    } else {
                        // Lost the insert race; re-read on the next attempt.
                        tracing::trace!(
                            counter = %family.name,
                            scope,
                            "counter insert race lost, re-reading"
                        );
                        continue;
                    }
                }
            };

            // Range is checked before any write so a full counter (or one
            // seeded below 1) fails cleanly instead of being advanced first.
            if current < 1 || current > capacity(family.width) {
                return Err(OpError::Core(
                    CounterExhausted {
                        value: current,
                        width: family.width,
                        capacity: capacity(family.width),
                    }
                    .into(),
                ));
            }

            if self
                .store
                .advance_counter(&family.name, scope, current, current + 1, now_ms())?
            {
                let code = Code::encode(current, family.width)?;
                tracing::debug!(
                    counter = %family.name,
                    scope,
                    value = current,
                    code = %code,
                    "allocated counter value"
                );
                return Ok(code);
            }

            tracing::trace!(
                counter = %family.name,
                scope,
                attempt,
                "counter compare-and-swap lost, retrying"
            );
        }

        Err(OpError::Contention {
            counter: family.name.clone(),
            scope: scope.to_string(),
            attempts: self.retry.max_attempts,
        })
    }
}
