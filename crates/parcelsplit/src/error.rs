//! Error types shared by the engine.
//!
//! - `GeometryError`: a boolean operation failed (backend panic or non-finite
//!   output). Always recoverable: callers retry at reduced precision, then drop
//!   the offending branch or candidate.
//! - `ConfigError`: invalid parameters, reported once before any recursion.

use std::fmt;

/// Failure of a single geometric operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// The boolean backend panicked (self-intersection, topology collapse).
    Topology { op: &'static str },
    /// The operation returned coordinates that are NaN or infinite.
    NonFinite { op: &'static str },
}

impl GeometryError {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Topology { op } | Self::NonFinite { op } => op,
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology { op } => write!(f, "topology failure during {op}"),
            Self::NonFinite { op } => write!(f, "non-finite coordinates produced by {op}"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Invalid engine or profile parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    Invalid { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { reason } => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Shared check used by every `validate()`: finite and `>= 0`.
pub(crate) fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(format!("{name} must be finite")));
    }
    if value < 0.0 {
        return Err(ConfigError::invalid(format!("{name} must be >= 0")));
    }
    Ok(())
}
