// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use sigma_chain_exports::objects::OperationObject;
use sigma_chain_exports::{ChainError, OperationCoordinates};
use sigma_chainbase::{Database, ObjectId};
use sigma_logging::sigma_trace;
use sigma_models::Operation;

/// Appends applied operations to the log table.
///
/// Log rows live in the store, so a discarded session removes the rows it
/// appended together with every other change.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    /// last virtual operation counter handed out in the current block
    virtual_op: u64,
}

impl Recorder {
    /// Restarts the virtual operation counter. Called at the start of every block
    /// so the counter only depends on the block content.
    pub(crate) fn start_block(&mut self) {
        self.virtual_op = 0;
    }

    /// Appends `op` at `coordinates`. Virtual operations get the next non-zero
    /// counter value, signer operations get 0.
    pub(crate) fn record(
        &mut self,
        db: &mut Database,
        op: Operation,
        coordinates: &OperationCoordinates,
        is_virtual: bool,
    ) -> Result<ObjectId<OperationObject>, ChainError> {
        let virtual_op = if is_virtual {
            self.virtual_op = self.virtual_op.checked_add(1).ok_or_else(|| {
                ChainError::ConsistencyFault("virtual operation counter overflow".to_string())
            })?;
            self.virtual_op
        } else {
            0
        };
        if is_virtual {
            sigma_trace!("chain.recorder.virtual_op", {
                "name": op.name(),
                "block": coordinates.block,
                "trx_in_block": coordinates.trx_in_block,
                "virtual_op": virtual_op
            });
        }
        let id = db.create(|id| OperationObject {
            id,
            trx_id: coordinates.trx_id,
            block: coordinates.block,
            trx_in_block: coordinates.trx_in_block,
            op_in_trx: coordinates.op_in_trx,
            virtual_op,
            timestamp: coordinates.timestamp,
            op,
        })?;
        Ok(id)
    }
}
