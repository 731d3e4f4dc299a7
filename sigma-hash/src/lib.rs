// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

#![warn(missing_docs)]
//! Fixed-size digests used for transaction and block identities
pub use error::HashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use settings::HASH_SIZE_BYTES;

mod error;
mod hash;
mod settings;
