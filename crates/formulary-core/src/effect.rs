//! Retry and side-effect classification carried by errors.

/// Whether retrying the failed operation can succeed as-is.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// The inputs or stored state must change first.
    Permanent,
    /// Transient contention or outage; a retry may go through.
    Retryable,
    /// Not classified.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What is known about durable writes at the point an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Nothing was written.
    None,
    /// A write landed (for counters: values burned, never reused).
    Some,
    /// The write may or may not have landed.
    Unknown,
}
