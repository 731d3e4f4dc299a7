// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use displaydoc::Display;
use thiserror::Error;

/// Result alias for model-level errors
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// Errors raised while building or decoding protocol types
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum ModelsError {
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// sigma_hash error: {0}
    HashError(#[from] sigma_hash::HashError),
    /// Time error {0}
    TimeError(#[from] sigma_time::TimeError),
    /// amount parse error: {0}
    AmountParseError(String),
    /// invalid account name: {0}
    InvalidAccountName(String),
    /// invalid public key: {0}
    InvalidPublicKey(String),
    /// invalid authority: {0}
    InvalidAuthority(String),
    /// block number overflow
    BlockNumberOverflow,
}
