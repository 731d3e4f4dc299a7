// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::account::{
    AccountNameDeserializer, AccountNameSerializer, PublicKey, PublicKeyDeserializer,
    PublicKeySerializer,
};
use crate::authority::{Approval, AuthorityLevel};
use crate::config::constants::{MAX_OPERATIONS_PER_TRANSACTION, MAX_REQUIRED_AUTHS};
use crate::error::ModelsError;
use crate::operation::{Operation, OperationDeserializer, OperationSerializer};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use sigma_hash::Hash;
use sigma_serialization::{
    Deserializer, SerializeError, Serializer, U16VarIntDeserializer, U16VarIntSerializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use sigma_time::{SigmaTime, SigmaTimeDeserializer, SigmaTimeSerializer};
use std::collections::BTreeSet;
use std::fmt::Formatter;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Transaction identifier: hash of the unsigned transaction content
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(Hash);

impl TransactionId {
    /// Wraps a hash
    pub const fn new(hash: Hash) -> Self {
        TransactionId(hash)
    }

    /// Id used for operations not attached to any transaction
    pub const fn zero() -> Self {
        TransactionId(Hash::zero())
    }

    /// Inner hash
    pub fn get_hash(&self) -> &Hash {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TransactionId(Hash::from_str(s)?))
    }
}

/// A signed bundle of operations applied atomically.
///
/// `approvals` carries the authority levels whose signatures were verified
/// before the transaction reached the chain, `signing_keys` the keys those
/// signatures were made with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// low 16 bits of a recent block number
    pub ref_block_num: u16,
    /// bytes 4..8 of that block's id
    pub ref_block_prefix: u32,
    /// the transaction is rejected once the head time passes this instant
    pub expiration: SigmaTime,
    /// operations, applied in order
    pub operations: Vec<Operation>,
    /// verified signer approvals
    pub approvals: BTreeSet<Approval>,
    /// verified signing keys
    pub signing_keys: BTreeSet<PublicKey>,
}

impl Transaction {
    /// Bytes the id is computed from: everything but the approvals and keys
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let mut buffer = Vec::new();
        TransactionSerializer::new().serialize_unsigned(self, &mut buffer)?;
        Ok(buffer)
    }

    /// Computes the transaction id
    pub fn id(&self) -> Result<TransactionId, ModelsError> {
        let bytes = self
            .unsigned_bytes()
            .map_err(|err| ModelsError::SerializeError(err.to_string()))?;
        Ok(TransactionId(Hash::compute_from(&bytes)))
    }

    /// Size of the full serialized transaction
    pub fn serialized_size(&self) -> Result<usize, ModelsError> {
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(self, &mut buffer)
            .map_err(|err| ModelsError::SerializeError(err.to_string()))?;
        Ok(buffer.len())
    }

    /// true if `account` approved at `level` or stronger
    pub fn is_approved_by(&self, account: &crate::AccountName, level: AuthorityLevel) -> bool {
        self.approvals
            .iter()
            .any(|approval| &approval.account == account && approval.level.satisfies(level))
    }
}

/// Serializer for `Transaction`
#[derive(Clone, Default)]
pub struct TransactionSerializer {
    u16_serializer: U16VarIntSerializer,
    u32_serializer: U32VarIntSerializer,
    time_serializer: SigmaTimeSerializer,
    operation_serializer: OperationSerializer,
    account_name_serializer: AccountNameSerializer,
    public_key_serializer: PublicKeySerializer,
}

impl TransactionSerializer {
    /// Creates a `TransactionSerializer`
    pub const fn new() -> Self {
        Self {
            u16_serializer: U16VarIntSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            time_serializer: SigmaTimeSerializer::new(),
            operation_serializer: OperationSerializer::new(),
            account_name_serializer: AccountNameSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
        }
    }

    fn serialize_count(
        &self,
        count: usize,
        what: &str,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u32 = count
            .try_into()
            .map_err(|_| SerializeError::NumberTooBig(format!("{} {}", count, what)))?;
        self.u32_serializer.serialize(&count, buffer)
    }

    fn serialize_unsigned(
        &self,
        value: &Transaction,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u16_serializer.serialize(&value.ref_block_num, buffer)?;
        buffer.extend(value.ref_block_prefix.to_le_bytes());
        self.time_serializer.serialize(&value.expiration, buffer)?;
        let count: u32 = value.operations.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} operations", value.operations.len()))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for operation in &value.operations {
            self.operation_serializer.serialize(operation, buffer)?;
        }
        Ok(())
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.serialize_unsigned(value, buffer)?;
        self.serialize_count(value.approvals.len(), "approvals", buffer)?;
        for approval in &value.approvals {
            self.account_name_serializer
                .serialize(&approval.account, buffer)?;
            buffer.push(u8::from(approval.level));
        }
        self.serialize_count(value.signing_keys.len(), "signing keys", buffer)?;
        for key in &value.signing_keys {
            self.public_key_serializer.serialize(key, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Transaction`
#[derive(Clone)]
pub struct TransactionDeserializer {
    u16_deserializer: U16VarIntDeserializer,
    time_deserializer: SigmaTimeDeserializer,
    operation_count_deserializer: U32VarIntDeserializer,
    operation_deserializer: OperationDeserializer,
    approval_count_deserializer: U32VarIntDeserializer,
    account_name_deserializer: AccountNameDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
}

impl TransactionDeserializer {
    /// Creates a `TransactionDeserializer`
    pub fn new() -> Self {
        Self {
            u16_deserializer: U16VarIntDeserializer::new(Included(0), Included(u16::MAX)),
            time_deserializer: SigmaTimeDeserializer::new((
                Included(SigmaTime::from_millis(0)),
                Included(SigmaTime::max()),
            )),
            operation_count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_OPERATIONS_PER_TRANSACTION),
            ),
            operation_deserializer: OperationDeserializer::new(),
            approval_count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_REQUIRED_AUTHS * 3),
            ),
            account_name_deserializer: AccountNameDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
        }
    }

    fn ref_prefix<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        let (rest, bytes) = nom::bytes::complete::take::<usize, &'a [u8], E>(4)(input)?;
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(bytes);
        Ok((rest, u32::from_le_bytes(prefix)))
    }

    fn approval<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Approval, E> {
        let (rest, account) = self.account_name_deserializer.deserialize::<E>(input)?;
        let (rest, level) = nom::number::complete::u8::<&'a [u8], E>(rest)?;
        let level = AuthorityLevel::try_from(level)
            .map_err(|_| nom::Err::Error(E::from_error_kind(rest, ErrorKind::Verify)))?;
        Ok((rest, Approval::new(account, level)))
    }
}

impl Default for TransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context(
            "Failed Transaction deserialization",
            tuple((
                context("Failed ref_block_num deserialization", |input| {
                    self.u16_deserializer.deserialize(input)
                }),
                context("Failed ref_block_prefix deserialization", |input| {
                    self.ref_prefix(input)
                }),
                context("Failed expiration deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context(
                    "Failed operations deserialization",
                    length_count(
                        |input| self.operation_count_deserializer.deserialize(input),
                        |input| self.operation_deserializer.deserialize(input),
                    ),
                ),
                context(
                    "Failed approvals deserialization",
                    length_count(
                        |input| self.approval_count_deserializer.deserialize(input),
                        |input| self.approval(input),
                    ),
                ),
                context(
                    "Failed signing_keys deserialization",
                    length_count(
                        |input| self.approval_count_deserializer.deserialize(input),
                        |input| self.public_key_deserializer.deserialize(input),
                    ),
                ),
            )),
        )
        .map(
            |(ref_block_num, ref_block_prefix, expiration, operations, approvals, signing_keys)| {
                Transaction {
                    ref_block_num,
                    ref_block_prefix,
                    expiration,
                    operations,
                    approvals: approvals.into_iter().collect(),
                    signing_keys: signing_keys.into_iter().collect(),
                }
            },
        )
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::TransferOperation;
    use crate::{AccountName, Amount};
    use sigma_serialization::DeserializeError;

    fn transfer_transaction(amount: u64) -> Transaction {
        Transaction {
            ref_block_num: 12,
            ref_block_prefix: 0xdead_beef,
            expiration: SigmaTime::from_millis(1_700_000_000_000),
            operations: vec![Operation::Transfer(TransferOperation {
                from: AccountName::from_str("alice").unwrap(),
                to: AccountName::from_str("bob").unwrap(),
                amount: Amount::from_raw(amount),
                memo: "rent".to_string(),
            })],
            approvals: BTreeSet::from([Approval::new(
                AccountName::from_str("alice").unwrap(),
                AuthorityLevel::Active,
            )]),
            signing_keys: BTreeSet::new(),
        }
    }

    #[test]
    fn id_ignores_approvals() {
        let mut signed = transfer_transaction(5_000);
        signed
            .signing_keys
            .insert(PublicKey::from_str("SGT7ZPrxj5P9C3h5t3i1m").unwrap());
        let mut unsigned = signed.clone();
        unsigned.approvals.clear();
        unsigned.signing_keys.clear();
        assert_eq!(signed.id().unwrap(), unsigned.id().unwrap());
        assert_ne!(
            signed.id().unwrap(),
            transfer_transaction(5_001).id().unwrap()
        );
    }

    #[test]
    fn binary_form_is_stable() {
        let mut trx = transfer_transaction(5_000);
        trx.signing_keys
            .insert(PublicKey::from_str("SGT7ZPrxj5P9C3h5t3i1m").unwrap());
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(&trx, &mut buffer)
            .unwrap();
        let (rest, decoded) = TransactionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, trx);
        assert_eq!(decoded.id().unwrap(), trx.id().unwrap());
        assert_eq!(trx.serialized_size().unwrap(), buffer.len());
    }

    #[test]
    fn owner_approval_covers_active() {
        let mut trx = transfer_transaction(1);
        let alice = AccountName::from_str("alice").unwrap();
        assert!(trx.is_approved_by(&alice, AuthorityLevel::Posting));
        assert!(!trx.is_approved_by(&alice, AuthorityLevel::Owner));
        trx.approvals = BTreeSet::from([Approval::new(alice.clone(), AuthorityLevel::Owner)]);
        assert!(trx.is_approved_by(&alice, AuthorityLevel::Active));
    }
}
