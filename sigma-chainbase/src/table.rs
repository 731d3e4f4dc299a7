// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::error::StoreError;
use crate::object::{Index, IndexKey, Object, ObjectId};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Bound::{Included, Unbounded};

/// Inverse of one mutation
#[derive(Debug, Clone)]
enum Change<T> {
    /// record created, undone by removing it
    Created(u64),
    /// record modified, holds the value before the modification
    Modified(T),
    /// record removed, holds the removed value
    Removed(T),
}

#[derive(Debug, Clone)]
struct UndoState<T> {
    revision: i64,
    old_next_id: u64,
    changes: Vec<Change<T>>,
}

/// All records of one type
#[derive(Debug, Clone)]
pub(crate) struct Table<T: Object> {
    objects: BTreeMap<u64, T>,
    indexes: Vec<BTreeSet<(IndexKey, u64)>>,
    next_id: u64,
    undo_stack: VecDeque<UndoState<T>>,
}

impl<T: Object> Table<T> {
    pub(crate) fn new() -> Self {
        Table {
            objects: BTreeMap::new(),
            indexes: T::INDEXES.iter().map(|_| BTreeSet::new()).collect(),
            next_id: 0,
            undo_stack: VecDeque::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn find(&self, id: ObjectId<T>) -> Option<&T> {
        self.objects.get(&id.to_raw())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.objects.values()
    }

    fn index_rows(&self, index: Index<T>) -> Result<&BTreeSet<(IndexKey, u64)>, StoreError> {
        self.indexes.get(index.position()).ok_or_else(|| {
            StoreError::IndexArity(format!(
                "{} has no index at position {}",
                T::TABLE_NAME,
                index.position()
            ))
        })
    }

    pub(crate) fn find_by(&self, index: Index<T>, key: &IndexKey) -> Result<Option<&T>, StoreError> {
        let rows = self.index_rows(index)?;
        Ok(rows
            .range((Included((key.clone(), 0)), Included((key.clone(), u64::MAX))))
            .next()
            .and_then(|(_, id)| self.objects.get(id)))
    }

    pub(crate) fn iter_by(
        &self,
        index: Index<T>,
    ) -> Result<impl Iterator<Item = &T> + '_, StoreError> {
        let rows = self.index_rows(index)?;
        Ok(rows.iter().filter_map(|(_, id)| self.objects.get(id)))
    }

    pub(crate) fn iter_by_prefix(
        &self,
        index: Index<T>,
        prefix: &IndexKey,
    ) -> Result<impl Iterator<Item = &T> + '_, StoreError> {
        let rows = self.index_rows(index)?;
        let prefix = prefix.clone();
        Ok(rows
            .range((Included((prefix.clone(), 0)), Unbounded))
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .filter_map(|(_, id)| self.objects.get(id)))
    }

    fn keys_of(&self, object: &T) -> Result<Vec<IndexKey>, StoreError> {
        let keys = object.index_keys();
        if keys.len() != T::INDEXES.len() {
            return Err(StoreError::IndexArity(format!(
                "{} declares {} indexes but produced {} keys",
                T::TABLE_NAME,
                T::INDEXES.len(),
                keys.len()
            )));
        }
        Ok(keys)
    }

    /// Fails if a unique key of `keys` is held by a record other than `id`
    fn check_unique(&self, id: u64, keys: &[IndexKey]) -> Result<(), StoreError> {
        for ((def, rows), key) in T::INDEXES.iter().zip(&self.indexes).zip(keys) {
            if !def.unique {
                continue;
            }
            let holder = rows
                .range((Included((key.clone(), 0)), Included((key.clone(), u64::MAX))))
                .map(|(_, holder)| *holder)
                .find(|holder| *holder != id);
            if holder.is_some() {
                return Err(StoreError::ConstraintViolation(format!(
                    "{}.{} already contains {}",
                    T::TABLE_NAME,
                    def.name,
                    key
                )));
            }
        }
        Ok(())
    }

    fn insert_rows(&mut self, id: u64, keys: Vec<IndexKey>) {
        for (rows, key) in self.indexes.iter_mut().zip(keys) {
            rows.insert((key, id));
        }
    }

    fn remove_rows(&mut self, id: u64, keys: Vec<IndexKey>) {
        for (rows, key) in self.indexes.iter_mut().zip(keys) {
            rows.remove(&(key, id));
        }
    }

    fn record(&mut self, change: Change<T>) {
        if let Some(state) = self.undo_stack.back_mut() {
            state.changes.push(change);
        }
    }

    pub(crate) fn create<F>(&mut self, constructor: F) -> Result<ObjectId<T>, StoreError>
    where
        F: FnOnce(ObjectId<T>) -> T,
    {
        let id = self.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| StoreError::IdSpaceExhausted(T::TABLE_NAME.to_string()))?;
        let object = constructor(ObjectId::new(id));
        if object.id().to_raw() != id {
            return Err(StoreError::IdentityChanged(format!(
                "{} created with id {} instead of {}",
                T::TABLE_NAME,
                object.id(),
                id
            )));
        }
        let keys = self.keys_of(&object)?;
        self.check_unique(id, &keys)?;
        self.insert_rows(id, keys);
        self.objects.insert(id, object);
        self.next_id = next_id;
        self.record(Change::Created(id));
        Ok(ObjectId::new(id))
    }

    pub(crate) fn modify<F>(&mut self, id: ObjectId<T>, mutator: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut T),
    {
        let raw = id.to_raw();
        let before = self
            .objects
            .get(&raw)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", T::TABLE_NAME, id)))?;
        let mut after = before.clone();
        mutator(&mut after);
        if after.id() != id {
            return Err(StoreError::IdentityChanged(format!(
                "{} {} modified into {}",
                T::TABLE_NAME,
                id,
                after.id()
            )));
        }
        let old_keys = self.keys_of(&before)?;
        let new_keys = self.keys_of(&after)?;
        self.check_unique(raw, &new_keys)?;
        self.remove_rows(raw, old_keys);
        self.insert_rows(raw, new_keys);
        self.objects.insert(raw, after);
        self.record(Change::Modified(before));
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: ObjectId<T>) -> Result<T, StoreError> {
        let raw = id.to_raw();
        let object = self
            .objects
            .remove(&raw)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", T::TABLE_NAME, id)))?;
        let keys = self.keys_of(&object)?;
        self.remove_rows(raw, keys);
        self.record(Change::Removed(object.clone()));
        Ok(object)
    }

    /// Puts back `object` in place of whatever holds its id, without recording
    fn restore(&mut self, object: T) -> Result<(), StoreError> {
        let raw = object.id().to_raw();
        if let Some(current) = self.objects.remove(&raw) {
            let keys = self.keys_of(&current)?;
            self.remove_rows(raw, keys);
        }
        let keys = self.keys_of(&object)?;
        self.insert_rows(raw, keys);
        self.objects.insert(raw, object);
        Ok(())
    }

    fn revert(&mut self, state: UndoState<T>) -> Result<(), StoreError> {
        for change in state.changes.into_iter().rev() {
            match change {
                Change::Created(raw) => {
                    let object = self.objects.remove(&raw).ok_or_else(|| {
                        StoreError::Corrupted(format!(
                            "created {} {} is missing on undo",
                            T::TABLE_NAME,
                            raw
                        ))
                    })?;
                    let keys = self.keys_of(&object)?;
                    self.remove_rows(raw, keys);
                }
                Change::Modified(before) | Change::Removed(before) => self.restore(before)?,
            }
        }
        self.next_id = state.old_next_id;
        Ok(())
    }
}

/// Type-erased table, lets the database drive undo on every table at once
pub(crate) trait AbstractTable: Send + Sync {
    fn name(&self) -> &'static str;
    fn start_undo(&mut self, revision: i64);
    fn undo(&mut self) -> Result<(), StoreError>;
    fn squash(&mut self);
    fn commit(&mut self, revision: i64);
    /// canonical json rendering, used to fingerprint the database
    fn canonical_json(&self) -> Result<serde_json::Value, StoreError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Object> AbstractTable for Table<T> {
    fn name(&self) -> &'static str {
        T::TABLE_NAME
    }

    fn start_undo(&mut self, revision: i64) {
        self.undo_stack.push_back(UndoState {
            revision,
            old_next_id: self.next_id,
            changes: Vec::new(),
        });
    }

    fn undo(&mut self) -> Result<(), StoreError> {
        let state = self.undo_stack.pop_back().ok_or(StoreError::NoUndoSession)?;
        self.revert(state)
    }

    fn squash(&mut self) {
        let Some(top) = self.undo_stack.pop_back() else {
            return;
        };
        if let Some(parent) = self.undo_stack.back_mut() {
            parent.changes.extend(top.changes);
        }
    }

    fn commit(&mut self, revision: i64) {
        while self
            .undo_stack
            .front()
            .map(|state| state.revision <= revision)
            .unwrap_or(false)
        {
            self.undo_stack.pop_front();
        }
    }

    fn canonical_json(&self) -> Result<serde_json::Value, StoreError> {
        let objects = self
            .objects
            .values()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StoreError::SerializationError(format!("{}: {}", T::TABLE_NAME, err)))?;
        Ok(serde_json::json!({
            "table": T::TABLE_ID,
            "next_id": self.next_id,
            "objects": objects,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
