// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! # General description
//!
//! In-memory object store with undoable sessions.
//!
//! Records are grouped in tables, one per record type. Each record has a
//! sequential id unique within its table and appears in every secondary
//! index its type declares. Indexes are ordered sets of `(key, id)` rows
//! kept in step with the records on every mutation.
//!
//! # Architecture
//!
//! ## `object.rs`
//! The `Object` trait implemented by stored types, typed ids, and index keys.
//!
//! ## `table.rs`
//! Storage of one record type together with its stack of undo states. An undo
//! state is the ordered log of inverse operations recorded while it was on top.
//!
//! ## `database.rs`
//! The `Database` owning every table and the revision counter. Undo, squash
//! and commit act on all tables at once.
//!
//! ## `session.rs`
//! A guard over one undo state. Dropping a session that was neither pushed,
//! committed nor discarded rolls it back.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod database;
mod error;
mod object;
mod session;
mod table;

pub use database::Database;
pub use error::StoreError;
pub use object::{Index, IndexDef, IndexKey, KeyPart, Object, ObjectId};
pub use session::Session;

#[cfg(test)]
mod tests;
