// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::objects::OperationObject;
use serde::{Deserialize, Serialize};
use sigma_models::{Operation, TransactionId};
use sigma_time::SigmaTime;

/// Position of an operation in the chain history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCoordinates {
    /// enclosing transaction, zero outside transactions
    pub trx_id: TransactionId,
    /// block number
    pub block: u32,
    /// position of the transaction in the block
    pub trx_in_block: u32,
    /// position of the operation in the transaction
    pub op_in_trx: u16,
    /// block time
    pub timestamp: SigmaTime,
}

/// Entry of the applied operation log, as seen by external consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedOperation {
    /// sequential operation id
    pub op_id: u64,
    /// enclosing transaction
    pub trx_id: TransactionId,
    /// block number
    pub block: u32,
    /// position of the transaction in the block
    pub trx_in_block: u32,
    /// position of the operation in the transaction
    pub op_in_trx: u16,
    /// non-zero for virtual operations
    pub virtual_op: u64,
    /// block time
    pub timestamp: SigmaTime,
    /// payload
    pub op: Operation,
}

impl From<&OperationObject> for AppliedOperation {
    fn from(object: &OperationObject) -> Self {
        AppliedOperation {
            op_id: object.id.to_raw(),
            trx_id: object.trx_id,
            block: object.block,
            trx_in_block: object.trx_in_block,
            op_in_trx: object.op_in_trx,
            virtual_op: object.virtual_op,
            timestamp: object.timestamp,
            op: object.op.clone(),
        }
    }
}
