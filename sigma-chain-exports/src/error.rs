// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use displaydoc::Display;
use sigma_chainbase::StoreError;
use sigma_models::ModelsError;
use thiserror::Error;

/// Reason a transaction or a block was refused
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// not found: {0}
    NotFound(String),
    /// unauthorized: {0}
    Unauthorized(String),
    /// invalid operation: {0}
    InvalidOperation(String),
    /// not matured: {0}
    NotMatured(String),
    /// too early: {0}
    TooEarly(String),
    /// constraint violation: {0}
    ConstraintViolation(String),
    /// consistency fault: {0}
    ConsistencyFault(String),
}

impl ChainError {
    /// A fault means the in-memory invariants are broken: rolling back the
    /// current session does not repair it and block processing must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChainError::ConsistencyFault(_))
    }
}

impl From<StoreError> for ChainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) | StoreError::NotFoundByKey(msg) => ChainError::NotFound(msg),
            StoreError::ConstraintViolation(msg) => ChainError::ConstraintViolation(msg),
            other => ChainError::ConsistencyFault(other.to_string()),
        }
    }
}

impl From<ModelsError> for ChainError {
    fn from(err: ModelsError) -> Self {
        match err {
            ModelsError::BlockNumberOverflow => ChainError::ConsistencyFault(err.to_string()),
            other => ChainError::InvalidOperation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn store_errors_are_classified() {
        assert_matches!(
            ChainError::from(StoreError::NotFoundByKey("account.by_name".into())),
            ChainError::NotFound(_)
        );
        assert_matches!(
            ChainError::from(StoreError::ConstraintViolation("dup".into())),
            ChainError::ConstraintViolation(_)
        );
        let fault = ChainError::from(StoreError::IdSpaceExhausted("account".into()));
        assert!(fault.is_fatal());
        assert!(!ChainError::TooEarly("mining".into()).is_fatal());
    }
}
