//! Core capability errors (code parsing, submission validation).
//!
//! These are bounded and stable: core errors represent domain/refusal states,
//! not library implementation details.

use thiserror::Error;

use crate::effect::{Effect, Transience};

/// A supplied code string does not match the expected letter-code pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("code `{raw}` is invalid: {reason}")]
pub struct InvalidCode {
    pub raw: String,
    pub reason: String,
}

/// The integer to encode exceeds the representable range for the code width.
///
/// Fatal configuration state: the operator must widen the code format or
/// re-scope the counter. Application retry logic cannot fix this.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("counter value {value} exceeds the {capacity} codes representable at width {width}")]
pub struct CounterExhausted {
    pub value: u64,
    pub width: usize,
    pub capacity: u64,
}

/// Errors from the code formatter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodeError {
    #[error(transparent)]
    Invalid(#[from] InvalidCode),
    #[error(transparent)]
    Exhausted(#[from] CounterExhausted),
}

/// A submitted item list fails domain constraints.
///
/// Reported before any counter allocation is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("submission contains no items")]
    Empty,
    #[error("duplicate sku `{sku}` in submission")]
    DuplicateSku { sku: String },
    #[error("unknown sku(s): {skus}")]
    UnknownSkus { skus: String },
    #[error("weight percent `{raw}` for sku `{sku}` is not a valid percentage")]
    InvalidWeight { sku: String, raw: String },
    #[error("weight percentages must sum to 100.00 after rounding, got {total}")]
    WeightSum { total: String },
    #[error("partner code `{code}` not found")]
    UnknownPartner { code: String },
    #[error("formulation `{code}` not found")]
    UnknownFormulation { code: String },
    #[error("production date `{raw}` is invalid: {reason}")]
    InvalidDate { raw: String, reason: String },
    #[error("{field} `{raw}` is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        raw: String,
        reason: String,
    },
}

/// Canonical error enum for the core capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    Code(#[from] CodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

impl From<InvalidCode> for CoreError {
    fn from(err: InvalidCode) -> Self {
        CoreError::Code(CodeError::Invalid(err))
    }
}

impl From<CounterExhausted> for CoreError {
    fn from(err: CounterExhausted) -> Self {
        CoreError::Code(CodeError::Exhausted(err))
    }
}
