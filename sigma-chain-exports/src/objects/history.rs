// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{BlockId, Operation, TransactionId};
use sigma_time::SigmaTime;

/// Applied transaction kept until expiration, for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionObject {
    /// identity
    pub id: ObjectId<TransactionObject>,
    /// transaction id
    pub trx_id: TransactionId,
    /// transaction expiration
    pub expiration: SigmaTime,
}

/// Transactions by id
pub const TRANSACTION_BY_TRX_ID: Index<TransactionObject> = Index::at(0);
/// Transactions by expiration
pub const TRANSACTION_BY_EXPIRATION: Index<TransactionObject> = Index::at(1);

impl TransactionObject {
    /// Key of `trx_id` in [`TRANSACTION_BY_TRX_ID`]
    pub fn trx_key(trx_id: &TransactionId) -> IndexKey {
        index_key!(trx_id.get_hash().to_bytes().as_slice())
    }
}

impl Object for TransactionObject {
    const TABLE_ID: u16 = 10;
    const TABLE_NAME: &'static str = "transaction";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_trx_id"),
        IndexDef::non_unique("by_expiration"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            Self::trx_key(&self.trx_id),
            index_key!(self.expiration.to_millis()),
        ]
    }
}

/// Id of a recent block, stored at `block_num & 0xffff`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummaryObject {
    /// identity
    pub id: ObjectId<BlockSummaryObject>,
    /// low 16 bits of the block number
    pub slot: u16,
    /// block id
    pub block_id: BlockId,
}

/// Block summaries by slot
pub const BLOCK_SUMMARY_BY_SLOT: Index<BlockSummaryObject> = Index::at(0);

impl BlockSummaryObject {
    /// Key of `slot` in [`BLOCK_SUMMARY_BY_SLOT`]
    pub fn slot_key(slot: u16) -> IndexKey {
        index_key!(slot)
    }
}

impl Object for BlockSummaryObject {
    const TABLE_ID: u16 = 11;
    const TABLE_NAME: &'static str = "block_summary";
    const INDEXES: &'static [IndexDef] = &[IndexDef::unique("by_slot")];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![Self::slot_key(self.slot)]
    }
}

/// Row of the applied operation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationObject {
    /// identity, also the operation id
    pub id: ObjectId<OperationObject>,
    /// enclosing transaction, zero for block-level virtual operations
    pub trx_id: TransactionId,
    /// block number
    pub block: u32,
    /// position of the transaction in the block
    pub trx_in_block: u32,
    /// position of the operation in the transaction
    pub op_in_trx: u16,
    /// zero for signer operations, a per-block counter for virtual ones
    pub virtual_op: u64,
    /// block time
    pub timestamp: SigmaTime,
    /// payload
    pub op: Operation,
}

/// Applied operations by block
pub const OPERATION_BY_BLOCK: Index<OperationObject> = Index::at(0);

impl OperationObject {
    /// Prefix of the operations of `block` in [`OPERATION_BY_BLOCK`]
    pub fn block_prefix(block: u32) -> IndexKey {
        index_key!(block)
    }
}

impl Object for OperationObject {
    const TABLE_ID: u16 = 12;
    const TABLE_NAME: &'static str = "operation";
    const INDEXES: &'static [IndexDef] = &[IndexDef::non_unique("by_block")];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![index_key!(self.block)]
    }
}
