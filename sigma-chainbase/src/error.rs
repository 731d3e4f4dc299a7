// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use displaydoc::Display;
use thiserror::Error;

/// Object store error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// record not found: {0}
    NotFound(String),
    /// no record for key: {0}
    NotFoundByKey(String),
    /// unique index violated: {0}
    ConstraintViolation(String),
    /// table not registered: {0}
    UnknownTable(String),
    /// table registered twice: {0}
    TableAlreadyRegistered(String),
    /// record identity changed: {0}
    IdentityChanged(String),
    /// wrong number of index keys: {0}
    IndexArity(String),
    /// id space exhausted in table {0}
    IdSpaceExhausted(String),
    /// no undo session to act on
    NoUndoSession,
    /// revision cannot be set while undo sessions are open
    UndoStackNotEmpty,
    /// corrupted store: {0}
    Corrupted(String),
    /// serialization error: {0}
    SerializationError(String),
}

impl StoreError {
    /// Errors that signal a broken store rather than a refused mutation
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            StoreError::NotFound(_)
                | StoreError::NotFoundByKey(_)
                | StoreError::ConstraintViolation(_)
        )
    }
}
