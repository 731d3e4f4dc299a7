// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::error::StoreError;
use crate::object::{Index, IndexKey, Object, ObjectId};
use crate::session::Session;
use crate::table::{AbstractTable, Table};
use sigma_hash::Hash;
use sigma_logging::sigma_trace;
use std::collections::{BTreeMap, VecDeque};

/// Set of tables sharing one revision counter and one undo stack discipline.
///
/// Every call to [`Database::start_session`] opens an undo state on all
/// tables and increments the revision. Mutations performed while no undo
/// state is open cannot be undone.
#[derive(Default)]
pub struct Database {
    tables: BTreeMap<u16, Box<dyn AbstractTable>>,
    revision: i64,
    undo_revisions: VecDeque<i64>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field(
                "tables",
                &self.tables.values().map(|table| table.name()).collect::<Vec<_>>(),
            )
            .field("revision", &self.revision)
            .field("undo_revisions", &self.undo_revisions)
            .finish()
    }
}

impl Database {
    /// Creates an empty database at revision 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the table of `T`. A table added while sessions are open
    /// receives an empty undo state for each of them.
    pub fn add_table<T: Object>(&mut self) -> Result<(), StoreError> {
        if self.tables.contains_key(&T::TABLE_ID) {
            return Err(StoreError::TableAlreadyRegistered(T::TABLE_NAME.to_string()));
        }
        let mut table = Table::<T>::new();
        for revision in &self.undo_revisions {
            table.start_undo(*revision);
        }
        self.tables.insert(T::TABLE_ID, Box::new(table));
        Ok(())
    }

    fn table<T: Object>(&self) -> Result<&Table<T>, StoreError> {
        self.tables
            .get(&T::TABLE_ID)
            .and_then(|table| table.as_any().downcast_ref::<Table<T>>())
            .ok_or_else(|| StoreError::UnknownTable(T::TABLE_NAME.to_string()))
    }

    fn table_mut<T: Object>(&mut self) -> Result<&mut Table<T>, StoreError> {
        self.tables
            .get_mut(&T::TABLE_ID)
            .and_then(|table| table.as_any_mut().downcast_mut::<Table<T>>())
            .ok_or_else(|| StoreError::UnknownTable(T::TABLE_NAME.to_string()))
    }

    /// Current revision
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Sets the revision, only allowed with no open undo state
    pub fn set_revision(&mut self, revision: i64) -> Result<(), StoreError> {
        if !self.undo_revisions.is_empty() {
            return Err(StoreError::UndoStackNotEmpty);
        }
        self.revision = revision;
        Ok(())
    }

    /// Revisions that can still be undone, oldest first
    pub fn undo_revisions(&self) -> impl Iterator<Item = i64> + '_ {
        self.undo_revisions.iter().copied()
    }

    /// Opens a new undo state. The returned guard rolls it back when dropped
    /// unless it is pushed, committed or discarded first.
    pub fn start_session(&mut self) -> Session<'_> {
        self.revision += 1;
        let revision = self.revision;
        for table in self.tables.values_mut() {
            table.start_undo(revision);
        }
        self.undo_revisions.push_back(revision);
        sigma_trace!("chainbase.session_started", { "revision": revision });
        Session::new(self, revision)
    }

    /// Reverts the newest undo state
    pub fn undo(&mut self) -> Result<(), StoreError> {
        let revision = self
            .undo_revisions
            .pop_back()
            .ok_or(StoreError::NoUndoSession)?;
        for table in self.tables.values_mut() {
            table.undo()?;
        }
        self.revision -= 1;
        sigma_trace!("chainbase.session_undone", { "revision": revision });
        Ok(())
    }

    /// Merges the newest undo state into the one below it. With a single
    /// undo state its changes become permanent.
    pub fn squash(&mut self) -> Result<(), StoreError> {
        let revision = self
            .undo_revisions
            .pop_back()
            .ok_or(StoreError::NoUndoSession)?;
        for table in self.tables.values_mut() {
            table.squash();
        }
        self.revision -= 1;
        sigma_trace!("chainbase.session_squashed", { "revision": revision });
        Ok(())
    }

    /// Makes every undo state up to `revision` permanent
    pub fn commit(&mut self, revision: i64) {
        for table in self.tables.values_mut() {
            table.commit(revision);
        }
        while self
            .undo_revisions
            .front()
            .map(|oldest| *oldest <= revision)
            .unwrap_or(false)
        {
            self.undo_revisions.pop_front();
        }
        sigma_trace!("chainbase.committed", { "revision": revision });
    }

    /// Makes the `count` oldest undo states permanent
    pub fn squash_oldest(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(revision) = self
            .undo_revisions
            .get(count - 1)
            .or_else(|| self.undo_revisions.back())
            .copied()
        {
            self.commit(revision);
        }
    }

    /// Reverts every open undo state
    pub fn undo_all(&mut self) -> Result<(), StoreError> {
        while !self.undo_revisions.is_empty() {
            self.undo()?;
        }
        Ok(())
    }

    /// Creates a record. The constructor receives the id the record must carry.
    pub fn create<T, F>(&mut self, constructor: F) -> Result<ObjectId<T>, StoreError>
    where
        T: Object,
        F: FnOnce(ObjectId<T>) -> T,
    {
        self.table_mut::<T>()?.create(constructor)
    }

    /// Applies `mutator` to a copy of the record, then stores the copy if its
    /// identity and unique keys are still valid
    pub fn modify<T, F>(&mut self, id: ObjectId<T>, mutator: F) -> Result<(), StoreError>
    where
        T: Object,
        F: FnOnce(&mut T),
    {
        self.table_mut::<T>()?.modify(id, mutator)
    }

    /// Removes a record and returns it
    pub fn remove<T: Object>(&mut self, id: ObjectId<T>) -> Result<T, StoreError> {
        self.table_mut::<T>()?.remove(id)
    }

    /// Record by id, if any
    pub fn find<T: Object>(&self, id: ObjectId<T>) -> Result<Option<&T>, StoreError> {
        Ok(self.table::<T>()?.find(id))
    }

    /// Record by id
    pub fn get<T: Object>(&self, id: ObjectId<T>) -> Result<&T, StoreError> {
        self.find(id)?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", T::TABLE_NAME, id)))
    }

    /// First record holding `key` in `index`, if any
    pub fn find_by<T: Object>(
        &self,
        index: Index<T>,
        key: &IndexKey,
    ) -> Result<Option<&T>, StoreError> {
        self.table::<T>()?.find_by(index, key)
    }

    /// First record holding `key` in `index`
    pub fn get_by<T: Object>(&self, index: Index<T>, key: &IndexKey) -> Result<&T, StoreError> {
        self.find_by(index, key)?.ok_or_else(|| {
            let name = T::INDEXES
                .get(index.position())
                .map(|def| def.name)
                .unwrap_or("?");
            StoreError::NotFoundByKey(format!("{}.{} {}", T::TABLE_NAME, name, key))
        })
    }

    /// Records in id order
    pub fn iter<T: Object>(&self) -> Result<impl Iterator<Item = &T> + '_, StoreError> {
        Ok(self.table::<T>()?.iter())
    }

    /// Records in the order of `index`
    pub fn iter_by<T: Object>(
        &self,
        index: Index<T>,
    ) -> Result<impl Iterator<Item = &T> + '_, StoreError> {
        self.table::<T>()?.iter_by(index)
    }

    /// Records of `index` whose key starts with `prefix`, in index order
    pub fn iter_by_prefix<T: Object>(
        &self,
        index: Index<T>,
        prefix: &IndexKey,
    ) -> Result<impl Iterator<Item = &T> + '_, StoreError> {
        self.table::<T>()?.iter_by_prefix(index, prefix)
    }

    /// Number of records of `T`
    pub fn count<T: Object>(&self) -> Result<usize, StoreError> {
        Ok(self.table::<T>()?.len())
    }

    /// Hash of the canonical content of every table, id counters included
    pub fn fingerprint(&self) -> Result<Hash, StoreError> {
        let tables = self
            .tables
            .values()
            .map(|table| table.canonical_json())
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = serde_json::to_vec(&tables)
            .map_err(|err| StoreError::SerializationError(err.to_string()))?;
        Ok(Hash::compute_from(&bytes))
    }
}
