//! Core domain types for the formulary code registry.
//!
//! Module hierarchy follows type dependency order:
//! - effect: error classification (Transience, Effect)
//! - error: code and validation errors
//! - code: bijective base-26 letter codes
//! - identity: Sku, IngredientBatchRef, ActorId
//! - weight: fixed-precision dry-weight percentages
//! - fingerprint: order-independent content hashing
//! - formulation: composite codes and location ids

#![forbid(unsafe_code)]

pub mod code;
pub mod effect;
pub mod error;
pub mod fingerprint;
pub mod formulation;
pub mod identity;
pub mod weight;

pub use code::{capacity, Code, DEFAULT_CODE_WIDTH};
pub use effect::{Effect, Transience};
pub use error::{CodeError, CoreError, CounterExhausted, InvalidCode, ValidationError};
pub use fingerprint::Fingerprint;
pub use formulation::{
    BatchCode, FormulationCode, LocationId, PartnerCode, ProductionDate, SetCode, WeightCode,
};
pub use identity::{ActorId, IngredientBatchRef, Sku, SkuParts};
pub use weight::{validate_weight_sum, WeightPercent, WEIGHT_PRECISION};
