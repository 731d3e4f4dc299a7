// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! # General description
//!
//! The chain worker applies blocks and transactions to the chain state held
//! in a versioned object store (`sigma_chainbase`).
//!
//! # Architecture
//!
//! ## controller.rs
//! Implements `ChainController`: a cloneable handle sharing the chain state
//! behind a read/write lock. Mutations take the write lock for a whole block.
//!
//! ## chain_state.rs
//! Owns the object store, the reversible blocks and the halt flag. Implements
//! `push_block`, `pop_block` and the pending transaction state.
//!
//! ## block_processing.rs
//! Block checks and the post-processing run after the transactions of a block:
//! head, participation, block size median, fee refresh, expirations,
//! maturations and the last irreversible block.
//!
//! ## dispatcher.rs
//! Applies one transaction inside its own store session: transaction checks,
//! then every operation through its evaluator. Any failure discards the session.
//!
//! ## evaluator.rs and evaluators/
//! One evaluation function per operation kind, selected by an exhaustive
//! match over the operation union.
//!
//! ## context.rs
//! What an evaluator sees: the store, the configuration, the approvals of the
//! transaction and the coordinates of the operation, plus balance and
//! authority helpers.
//!
//! ## recorder.rs
//! Appends signer and virtual operations to the applied operation log.
//!
//! ## global_state.rs
//! Access to the singleton global state record.
//!
//! ## genesis.rs
//! Initial chain state.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod block_processing;
mod chain_state;
mod context;
mod controller;
mod dispatcher;
mod evaluator;
mod evaluators;
mod genesis;
mod global_state;
mod recorder;

pub use chain_state::ChainState;
pub use controller::{start_chain_controller, ChainControllerImpl};

#[cfg(test)]
mod tests;
