// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::database::Database;
use crate::error::StoreError;
use std::ops::{Deref, DerefMut};
use tracing::error;

/// Guard over one undo state of a [`Database`].
///
/// Child sessions are opened through the guard itself, so a parent cannot be
/// finalised while a child is alive.
pub struct Session<'a> {
    db: &'a mut Database,
    revision: i64,
    active: bool,
}

impl<'a> Session<'a> {
    pub(crate) fn new(db: &'a mut Database, revision: i64) -> Self {
        Session {
            db,
            revision,
            active: true,
        }
    }

    /// Revision opened by this session
    pub fn revision(&self) -> i64 {
        self.revision
    }

    fn check_on_top(&self) -> Result<(), StoreError> {
        if self.db.revision() != self.revision {
            return Err(StoreError::Corrupted(format!(
                "session {} is not on top of the undo stack (revision {})",
                self.revision,
                self.db.revision()
            )));
        }
        Ok(())
    }

    /// Leaves the undo state open so it can be undone later through the database
    pub fn push(mut self) {
        self.active = false;
    }

    /// Merges the changes into the enclosing undo state
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.active = false;
        self.check_on_top()?;
        self.db.squash()
    }

    /// Reverts every change made during the session
    pub fn discard(mut self) -> Result<(), StoreError> {
        self.active = false;
        self.check_on_top()?;
        self.db.undo()
    }
}

impl Deref for Session<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        &*self.db
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        &mut *self.db
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.check_on_top().and_then(|_| self.db.undo()) {
            error!("could not roll back session {}: {}", self.revision, err);
        }
    }
}
