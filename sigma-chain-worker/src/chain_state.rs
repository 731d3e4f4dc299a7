// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! The chain state owns the object store and drives it through blocks.
//!
//! Store revisions follow block numbers: the genesis state is revision 0 and
//! every applied block leaves one undo state open, so the head block can be
//! popped as long as it is above the last irreversible block. Transactions
//! received outside blocks are applied in one extra pending undo state on top
//! of the head, dropped before the next block.

use crate::block_processing::apply_block;
use crate::dispatcher::{apply_transaction, BlockEnvironment};
use crate::genesis::init_genesis;
use crate::global_state::get_global_state;
use crate::recorder::Recorder;
use sigma_chain_exports::objects::{
    AccountObject, DynamicGlobalPropertyObject, OperationObject, ACCOUNT_BY_NAME,
    OPERATION_BY_BLOCK,
};
use sigma_chain_exports::{AppliedOperation, ChainConfig, ChainError};
use sigma_chainbase::Database;
use sigma_hash::Hash;
use sigma_models::{AccountName, Block, Transaction};
use std::collections::VecDeque;
use tracing::{debug, error, info};

/// Chain state machine
pub struct ChainState {
    /// chain configuration
    config: ChainConfig,
    /// versioned object store
    db: Database,
    /// applied operation log writer
    recorder: Recorder,
    /// blocks above the last irreversible block, oldest first
    reversible_blocks: VecDeque<Block>,
    /// number of the head block
    head_block_num: u32,
    /// whether the pending undo state is open
    pending: bool,
    /// transactions applied in the pending undo state
    pending_count: u32,
    /// set by the first consistency fault, refuses every later mutation
    halted: Option<ChainError>,
}

impl ChainState {
    /// Creates the genesis state described by `config`
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        let mut db = Database::new();
        init_genesis(&mut db, &config)?;
        Ok(ChainState {
            config,
            db,
            recorder: Recorder::default(),
            reversible_blocks: VecDeque::new(),
            head_block_num: 0,
            pending: false,
            pending_count: 0,
            halted: None,
        })
    }

    /// Chain configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Number of the head block
    pub fn head_block_num(&self) -> u32 {
        self.head_block_num
    }

    /// The fault that halted the chain, if any
    pub fn halted(&self) -> Option<&ChainError> {
        self.halted.as_ref()
    }

    /// Global state record, including pending transactions
    pub fn global_state(&self) -> Result<&DynamicGlobalPropertyObject, ChainError> {
        get_global_state(&self.db)
    }

    /// Account by name, including pending transactions
    pub fn find_account(&self, name: &AccountName) -> Result<Option<&AccountObject>, ChainError> {
        Ok(self
            .db
            .find_by(ACCOUNT_BY_NAME, &AccountObject::name_key(name))?)
    }

    /// Operations logged in block `block_num`, in application order
    pub fn applied_operations(
        &self,
        block_num: u32,
        only_virtual: bool,
    ) -> Result<Vec<AppliedOperation>, ChainError> {
        let prefix = OperationObject::block_prefix(block_num);
        Ok(self
            .db
            .iter_by_prefix(OPERATION_BY_BLOCK, &prefix)?
            .filter(|op| !only_virtual || op.virtual_op != 0)
            .map(AppliedOperation::from)
            .collect())
    }

    /// Hash of every table of the store
    pub fn fingerprint(&self) -> Result<Hash, ChainError> {
        Ok(self.db.fingerprint()?)
    }

    /// Applies `block` on top of the head. Pending transactions are dropped
    /// first. A rejected block leaves the state untouched.
    pub fn push_block(&mut self, block: Block) -> Result<(), ChainError> {
        self.check_halted()?;
        let result = self.try_push_block(block);
        self.halt_on_fault(result)
    }

    /// Undoes the head block and returns it
    pub fn pop_block(&mut self) -> Result<Block, ChainError> {
        self.check_halted()?;
        let result = self.try_pop_block();
        self.halt_on_fault(result)
    }

    /// Applies `transaction` in the pending state on top of the head
    pub fn push_transaction(&mut self, transaction: Transaction) -> Result<(), ChainError> {
        self.check_halted()?;
        let result = self.try_push_transaction(&transaction);
        self.halt_on_fault(result)
    }

    /// Drops every pending transaction
    pub fn clear_pending(&mut self) -> Result<(), ChainError> {
        self.check_halted()?;
        let result = self.try_clear_pending();
        self.halt_on_fault(result)
    }

    fn check_halted(&self) -> Result<(), ChainError> {
        match &self.halted {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn halt_on_fault<T>(&mut self, result: Result<T, ChainError>) -> Result<T, ChainError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                error!("chain halted at block {}: {}", self.head_block_num, err);
                self.halted = Some(err.clone());
            }
        }
        result
    }

    fn try_push_block(&mut self, block: Block) -> Result<(), ChainError> {
        self.try_clear_pending()?;
        if self.db.revision() != i64::from(self.head_block_num) {
            return Err(ChainError::ConsistencyFault(format!(
                "store revision {} does not match head block {}",
                self.db.revision(),
                self.head_block_num
            )));
        }
        let block_id = block.id()?;

        let mut session = self.db.start_session();
        let outcome = apply_block(
            &mut session,
            &self.config,
            &mut self.recorder,
            &block,
            block_id,
        );
        match outcome {
            Ok(()) => session.push(),
            Err(err) => {
                session.discard()?;
                debug!("block {} rejected: {}", block_id, err);
                return Err(err);
            }
        }

        self.head_block_num = block_id.block_num();
        let timestamp = block.header.timestamp;
        info!(
            "applied block {} at {} ({} transactions)",
            block_id,
            timestamp
                .format_instant()
                .unwrap_or_else(|_| timestamp.to_string()),
            block.transactions.len()
        );
        self.reversible_blocks.push_back(block);
        self.commit_irreversible()
    }

    /// Makes the undo states up to the last irreversible block permanent
    fn commit_irreversible(&mut self) -> Result<(), ChainError> {
        let lib = get_global_state(&self.db)?.last_irreversible_block_num;
        self.db.commit(i64::from(lib));
        while let Some(oldest) = self.reversible_blocks.front() {
            if oldest.block_num()? > lib {
                break;
            }
            self.reversible_blocks.pop_front();
        }
        Ok(())
    }

    fn try_pop_block(&mut self) -> Result<Block, ChainError> {
        self.try_clear_pending()?;
        let lib = get_global_state(&self.db)?.last_irreversible_block_num;
        if self.head_block_num <= lib {
            return Err(ChainError::InvalidOperation(format!(
                "head block {} is irreversible",
                self.head_block_num
            )));
        }
        let block = self.reversible_blocks.pop_back().ok_or_else(|| {
            ChainError::ConsistencyFault(format!(
                "no reversible block above irreversible block {}",
                lib
            ))
        })?;
        self.db.undo()?;
        self.head_block_num = get_global_state(&self.db)?.head_block_number;
        info!("popped block {}, head is now {}", block.id()?, self.head_block_num);
        Ok(block)
    }

    fn try_push_transaction(&mut self, transaction: &Transaction) -> Result<(), ChainError> {
        if !self.pending {
            self.db.start_session().push();
            self.pending = true;
            self.recorder.start_block();
        }
        let global = get_global_state(&self.db)?;
        let env = BlockEnvironment {
            block_num: self.head_block_num.checked_add(1).ok_or_else(|| {
                ChainError::ConsistencyFault("block number overflows".to_string())
            })?,
            timestamp: global.time,
            producer: global.current_bobserver.clone(),
        };
        apply_transaction(
            &mut self.db,
            &self.config,
            &mut self.recorder,
            &env,
            transaction,
            self.pending_count,
        )?;
        self.pending_count = self.pending_count.saturating_add(1);
        Ok(())
    }

    fn try_clear_pending(&mut self) -> Result<(), ChainError> {
        if self.pending {
            self.db.undo()?;
            self.pending = false;
            self.pending_count = 0;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    #[cfg(test)]
    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }
}
