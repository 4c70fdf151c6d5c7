//! Code allocation and dedup workflows for the formulary registry.
//!
//! The backing warehouse offers no row locks or multi-statement transactions;
//! the only coordination primitive is a single-row conditional write. This
//! crate builds three things on top of it: an optimistic-concurrency counter
//! allocator, a content-fingerprint dedup engine, and the lookup-or-create
//! workflows that mint set / weight-variant / batch-variant / partner /
//! location codes.

#![forbid(unsafe_code)]

pub use formulary_core as core;

pub mod alloc;
pub mod config;
pub mod error;
pub mod registry;
pub mod seed;
pub mod store;
pub mod telemetry;

pub use alloc::{Allocator, CounterFamily, RetryPolicy};
pub use config::Config;
pub use error::{ConfigError, Error, OpError, Result};
pub use registry::{PartnerListing, Registry};
pub use store::{CounterStore, MemoryStore, RegistryStore};

// Re-export core types at crate root for convenience.
pub use formulary_core::{
    ActorId, BatchCode, Code, CodeError, CoreError, CounterExhausted, Effect, Fingerprint,
    FormulationCode, IngredientBatchRef, InvalidCode, LocationId, PartnerCode, ProductionDate,
    SetCode, Sku, Transience, ValidationError, WeightCode, WeightPercent,
};
