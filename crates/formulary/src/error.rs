//! Operation-level and crate-level errors.

use thiserror::Error;

use formulary_core::{CodeError, CoreError, Effect, Transience, ValidationError};

use crate::store::StoreError;

/// Errors from allocation and registry workflows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The compare-and-swap loop exhausted its retry budget. Transient:
    /// the whole operation is safe to retry from the top.
    #[error("allocation contention on counter `{counter}` scope `{scope}` after {attempts} attempts")]
    Contention {
        counter: String,
        scope: String,
        attempts: u32,
    },

    /// The partner probe loop could not find an unused code.
    #[error("unable to allocate an unused partner code after {attempts} attempts")]
    PartnerProbeExhausted { attempts: u32 },
}

impl OpError {
    pub fn transience(&self) -> Transience {
        match self {
            OpError::Core(e) => e.transience(),
            OpError::Store(e) => e.transience(),
            OpError::Contention { .. } => Transience::Retryable,
            OpError::PartnerProbeExhausted { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            OpError::Core(e) => e.effect(),
            OpError::Store(e) => e.effect(),
            // A failed compare-and-swap never advanced the counter.
            OpError::Contention { .. } => Effect::None,
            // Probing burns counter values, which is safe (codes are skipped,
            // never reused) but is a visible effect.
            OpError::PartnerProbeExhausted { .. } => Effect::Some,
        }
    }
}

impl From<CodeError> for OpError {
    fn from(err: CodeError) -> Self {
        OpError::Core(err.into())
    }
}

impl From<ValidationError> for OpError {
    fn from(err: ValidationError) -> Self {
        OpError::Core(err.into())
    }
}

/// Configuration load/write failure.
#[derive(Debug, Error)]
#[error("config error: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

impl ConfigError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Crate-level convenience error: a thin wrapper over capability errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Op(e) => e.transience(),
            Error::Config(_) => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Op(e) => e.effect(),
            Error::Config(_) => Effect::None,
        }
    }
}
