// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>
//! Protocol data types: amounts, account names, authorities, operations,
//! transactions and blocks, with their binary codecs.

#![warn(missing_docs)]
#[macro_use]
extern crate lazy_static;

pub use account::{
    AccountName, AccountNameDeserializer, AccountNameSerializer, PublicKey,
    PublicKeyDeserializer, PublicKeySerializer,
};
pub use amount::{Amount, AmountDeserializer, AmountSerializer};
pub use authority::{
    Approval, Authority, AuthorityDeserializer, AuthorityLevel, AuthoritySerializer,
};
pub use block::{
    Block, BlockDeserializer, BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer,
    BlockId, BlockSerializer,
};
pub use error::{ModelsError, ModelsResult};
pub use operation::{Operation, OperationDeserializer, OperationSerializer, OperationTypeId};
pub use transaction::{Transaction, TransactionDeserializer, TransactionId, TransactionSerializer};

/// account names and public keys
pub mod account;
/// fixed-point coin amounts
pub mod amount;
/// weighted multi-party authorities
pub mod authority;
mod block;
/// protocol constants
pub mod config;
/// models error
pub mod error;
/// the closed set of operations
pub mod operation;
mod transaction;
