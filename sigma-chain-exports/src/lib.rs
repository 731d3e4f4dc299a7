// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! # General description
//!
//! Public face of the chain state machine: its configuration, its error
//! taxonomy, the records it keeps in the object store, the applied operation
//! log entries it exposes, and the controller trait implemented by the
//! worker crate.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod controller_traits;
mod error;
/// records stored in the object store
pub mod objects;
mod types;

pub use config::ChainConfig;
pub use controller_traits::ChainController;
pub use error::ChainError;
pub use types::{AppliedOperation, OperationCoordinates};

/// Test utils
#[cfg(feature = "test-exports")]
pub mod test_exports;
