//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failure of planning inputs or policy parameters.
///
/// Storage and model failures have their own error types in the crates that
/// own them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input or configuration (blank name, zero window, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A catalog or policy rule does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_detail() {
        assert_eq!(
            DomainError::validation("reference_window_days must be > 0").to_string(),
            "validation failed: reference_window_days must be > 0"
        );
        assert_eq!(
            DomainError::invalid_id("ProductId: must not be blank").to_string(),
            "invalid identifier: ProductId: must not be blank"
        );
    }
}
