// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::account::{AccountName, AccountNameDeserializer, AccountNameSerializer};
use crate::config::constants::MAX_TRANSACTIONS_PER_BLOCK;
use crate::error::ModelsError;
use crate::transaction::{Transaction, TransactionDeserializer, TransactionSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use sigma_hash::{Hash, HashDeserializer, HashSerializer, HASH_SIZE_BYTES};
use sigma_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use sigma_time::{SigmaTime, SigmaTimeDeserializer, SigmaTimeSerializer};
use std::fmt::Formatter;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Block identifier.
///
/// The first four bytes hold the big-endian block number, the rest comes
/// from the header hash, so the number of any block is readable from its id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(Hash);

impl BlockId {
    /// Builds the id of block `block_num` from its header hash
    pub fn new(hash: Hash, block_num: u32) -> Self {
        let mut bytes = hash.into_bytes();
        bytes[..4].copy_from_slice(&block_num.to_be_bytes());
        BlockId(Hash::from_bytes(&bytes))
    }

    /// Parent id of the first block
    pub const fn zero() -> Self {
        BlockId(Hash::zero())
    }

    /// Block number embedded in the id
    pub fn block_num(&self) -> u32 {
        let bytes = self.0.to_bytes();
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Bytes 4..8 as a little-endian word, referenced by transactions
    pub fn ref_prefix(&self) -> u32 {
        let bytes = self.0.to_bytes();
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]])
    }

    /// Inner hash
    pub fn get_hash(&self) -> &Hash {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BlockId(Hash::from_str(s)?))
    }
}

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// id of the parent block
    pub previous: BlockId,
    /// production slot time
    pub timestamp: SigmaTime,
    /// producing block observer
    pub bobserver: AccountName,
    /// merkle root of the transaction ids
    pub transaction_merkle_root: Hash,
}

impl BlockHeader {
    /// Number of this block, one past its parent
    pub fn block_num(&self) -> Result<u32, ModelsError> {
        self.previous
            .block_num()
            .checked_add(1)
            .ok_or(ModelsError::BlockNumberOverflow)
    }

    /// Computes the block id
    pub fn id(&self) -> Result<BlockId, ModelsError> {
        let mut buffer = Vec::new();
        BlockHeaderSerializer::new()
            .serialize(self, &mut buffer)
            .map_err(|err| ModelsError::SerializeError(err.to_string()))?;
        Ok(BlockId::new(Hash::compute_from(&buffer), self.block_num()?))
    }
}

/// A produced block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// header
    pub header: BlockHeader,
    /// included transactions, applied in order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Assembles a block and fills in its merkle root
    pub fn new(
        previous: BlockId,
        timestamp: SigmaTime,
        bobserver: AccountName,
        transactions: Vec<Transaction>,
    ) -> Result<Self, ModelsError> {
        let transaction_merkle_root = compute_merkle_root(&transactions)?;
        Ok(Block {
            header: BlockHeader {
                previous,
                timestamp,
                bobserver,
                transaction_merkle_root,
            },
            transactions,
        })
    }

    /// Block id
    pub fn id(&self) -> Result<BlockId, ModelsError> {
        self.header.id()
    }

    /// Block number
    pub fn block_num(&self) -> Result<u32, ModelsError> {
        self.header.block_num()
    }

    /// Merkle root recomputed from the transactions
    pub fn compute_merkle_root(&self) -> Result<Hash, ModelsError> {
        compute_merkle_root(&self.transactions)
    }

    /// Size of the full serialized block
    pub fn serialized_size(&self) -> Result<usize, ModelsError> {
        let mut buffer = Vec::new();
        BlockSerializer::new()
            .serialize(self, &mut buffer)
            .map_err(|err| ModelsError::SerializeError(err.to_string()))?;
        Ok(buffer.len())
    }
}

/// Pairwise blake3 tree over the transaction ids.
/// An odd node at the end of a level is paired with itself.
fn compute_merkle_root(transactions: &[Transaction]) -> Result<Hash, ModelsError> {
    if transactions.is_empty() {
        return Ok(Hash::zero());
    }
    let mut level = transactions
        .iter()
        .map(|trx| trx.id().map(|id| *id.get_hash()))
        .collect::<Result<Vec<Hash>, ModelsError>>()?;
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let mut data = Vec::with_capacity(2 * HASH_SIZE_BYTES);
                data.extend(left.to_bytes());
                data.extend(right.to_bytes());
                Hash::compute_from(&data)
            })
            .collect();
    }
    Ok(level[0])
}

/// Serializer for `BlockHeader`
#[derive(Clone, Default)]
pub struct BlockHeaderSerializer {
    hash_serializer: HashSerializer,
    time_serializer: SigmaTimeSerializer,
    account_name_serializer: AccountNameSerializer,
}

impl BlockHeaderSerializer {
    /// Creates a `BlockHeaderSerializer`
    pub const fn new() -> Self {
        Self {
            hash_serializer: HashSerializer::new(),
            time_serializer: SigmaTimeSerializer::new(),
            account_name_serializer: AccountNameSerializer::new(),
        }
    }
}

impl Serializer<BlockHeader> for BlockHeaderSerializer {
    fn serialize(&self, value: &BlockHeader, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.hash_serializer
            .serialize(value.previous.get_hash(), buffer)?;
        self.time_serializer.serialize(&value.timestamp, buffer)?;
        self.account_name_serializer
            .serialize(&value.bobserver, buffer)?;
        self.hash_serializer
            .serialize(&value.transaction_merkle_root, buffer)
    }
}

/// Deserializer for `BlockHeader`
#[derive(Clone)]
pub struct BlockHeaderDeserializer {
    hash_deserializer: HashDeserializer,
    time_deserializer: SigmaTimeDeserializer,
    account_name_deserializer: AccountNameDeserializer,
}

impl BlockHeaderDeserializer {
    /// Creates a `BlockHeaderDeserializer`
    pub fn new() -> Self {
        Self {
            hash_deserializer: HashDeserializer::new(),
            time_deserializer: SigmaTimeDeserializer::new((
                Included(SigmaTime::from_millis(0)),
                Included(SigmaTime::max()),
            )),
            account_name_deserializer: AccountNameDeserializer::new(),
        }
    }
}

impl Default for BlockHeaderDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<BlockHeader> for BlockHeaderDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BlockHeader, E> {
        context(
            "Failed BlockHeader deserialization",
            tuple((
                context("Failed previous deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed timestamp deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                context("Failed bobserver deserialization", |input| {
                    self.account_name_deserializer.deserialize(input)
                }),
                context("Failed merkle root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(previous, timestamp, bobserver, transaction_merkle_root)| BlockHeader {
                previous: BlockId(previous),
                timestamp,
                bobserver,
                transaction_merkle_root,
            },
        )
        .parse(buffer)
    }
}

/// Serializer for `Block`
#[derive(Clone, Default)]
pub struct BlockSerializer {
    header_serializer: BlockHeaderSerializer,
    u32_serializer: U32VarIntSerializer,
    transaction_serializer: TransactionSerializer,
}

impl BlockSerializer {
    /// Creates a `BlockSerializer`
    pub const fn new() -> Self {
        Self {
            header_serializer: BlockHeaderSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            transaction_serializer: TransactionSerializer::new(),
        }
    }
}

impl Serializer<Block> for BlockSerializer {
    fn serialize(&self, value: &Block, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.header_serializer.serialize(&value.header, buffer)?;
        let count: u32 = value.transactions.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("{} transactions", value.transactions.len()))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for transaction in &value.transactions {
            self.transaction_serializer.serialize(transaction, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Block`
#[derive(Clone)]
pub struct BlockDeserializer {
    header_deserializer: BlockHeaderDeserializer,
    count_deserializer: U32VarIntDeserializer,
    transaction_deserializer: TransactionDeserializer,
}

impl BlockDeserializer {
    /// Creates a `BlockDeserializer`
    pub fn new() -> Self {
        Self {
            header_deserializer: BlockHeaderDeserializer::new(),
            count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTIONS_PER_BLOCK),
            ),
            transaction_deserializer: TransactionDeserializer::new(),
        }
    }
}

impl Default for BlockDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Block> for BlockDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Block, E> {
        context(
            "Failed Block deserialization",
            tuple((
                |input| self.header_deserializer.deserialize(input),
                context(
                    "Failed transactions deserialization",
                    length_count(
                        |input| self.count_deserializer.deserialize(input),
                        |input| self.transaction_deserializer.deserialize(input),
                    ),
                ),
            )),
        )
        .map(|(header, transactions)| Block {
            header,
            transactions,
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{Approval, AuthorityLevel};
    use crate::operation::{Operation, PrintOperation};
    use crate::Amount;
    use sigma_serialization::DeserializeError;
    use std::collections::BTreeSet;

    fn print_transaction(raw: u64) -> Transaction {
        let root = AccountName::from_str("sigmaengine").unwrap();
        Transaction {
            ref_block_num: 0,
            ref_block_prefix: 0,
            expiration: SigmaTime::from_millis(10_000),
            operations: vec![Operation::Print(PrintOperation {
                account: root.clone(),
                amount: Amount::from_raw(raw),
            })],
            approvals: BTreeSet::from([Approval::new(root, AuthorityLevel::Active)]),
            signing_keys: BTreeSet::new(),
        }
    }

    #[test]
    fn id_embeds_block_number() {
        let hash = Hash::compute_from(b"header");
        let id = BlockId::new(hash, 0x0102_0304);
        assert_eq!(id.block_num(), 0x0102_0304);
        assert_eq!(&id.get_hash().to_bytes()[4..], &hash.to_bytes()[4..]);
        assert_eq!(BlockId::zero().block_num(), 0);
    }

    #[test]
    fn number_follows_parent() {
        let genesis_child = Block::new(
            BlockId::zero(),
            SigmaTime::from_millis(3_000),
            AccountName::from_str("sigmaengine").unwrap(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(genesis_child.block_num().unwrap(), 1);
        assert_eq!(genesis_child.header.transaction_merkle_root, Hash::zero());
        let id = genesis_child.id().unwrap();
        assert_eq!(id.block_num(), 1);

        let overflow = Block::new(
            BlockId::new(Hash::zero(), u32::MAX),
            SigmaTime::from_millis(3_000),
            AccountName::from_str("sigmaengine").unwrap(),
            Vec::new(),
        )
        .unwrap();
        assert!(matches!(
            overflow.block_num(),
            Err(ModelsError::BlockNumberOverflow)
        ));
    }

    #[test]
    fn merkle_root_depends_on_order() {
        let a = print_transaction(1);
        let b = print_transaction(2);
        let c = print_transaction(3);
        let root_abc = compute_merkle_root(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let root_bac = compute_merkle_root(&[b, a.clone(), c]).unwrap();
        assert_ne!(root_abc, root_bac);
        assert_eq!(
            compute_merkle_root(&[a.clone()]).unwrap(),
            *a.id().unwrap().get_hash()
        );
    }

    #[test]
    fn decoded_block_keeps_id() {
        let block = Block::new(
            BlockId::new(Hash::compute_from(b"parent"), 41),
            SigmaTime::from_millis(126_000),
            AccountName::from_str("sigmaengine").unwrap(),
            vec![print_transaction(7), print_transaction(8)],
        )
        .unwrap();
        let mut buffer = Vec::new();
        BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
        let (rest, decoded) = BlockDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded.id().unwrap(), block.id().unwrap());
        assert_eq!(decoded.compute_merkle_root().unwrap(), block.header.transaction_merkle_root);
        assert_eq!(block.serialized_size().unwrap(), buffer.len());
    }
}
