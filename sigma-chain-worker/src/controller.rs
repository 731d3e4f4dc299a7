// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! This module implements a chain controller.
//! See `sigma-chain-exports/controller_traits.rs` for functional details.

use crate::chain_state::ChainState;
use parking_lot::RwLock;
use sigma_chain_exports::objects::{AccountObject, DynamicGlobalPropertyObject};
use sigma_chain_exports::{AppliedOperation, ChainConfig, ChainController, ChainError};
use sigma_hash::Hash;
use sigma_models::{AccountName, Block, Transaction};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
/// implementation of the chain controller
pub struct ChainControllerImpl {
    /// current chain state (see chain_state.rs for details)
    pub(crate) chain_state: Arc<RwLock<ChainState>>,
}

impl ChainController for ChainControllerImpl {
    fn head_block_num(&self) -> u32 {
        self.chain_state.read().head_block_num()
    }

    fn get_global_state(&self) -> Result<DynamicGlobalPropertyObject, ChainError> {
        self.chain_state.read().global_state().cloned()
    }

    fn get_account(&self, name: &AccountName) -> Result<Option<AccountObject>, ChainError> {
        Ok(self.chain_state.read().find_account(name)?.cloned())
    }

    fn get_applied_operations(
        &self,
        block_num: u32,
        only_virtual: bool,
    ) -> Result<Vec<AppliedOperation>, ChainError> {
        self.chain_state
            .read()
            .applied_operations(block_num, only_virtual)
    }

    /// The write lock is held for the whole block
    fn push_block(&self, block: Block) -> Result<(), ChainError> {
        self.chain_state.write().push_block(block)
    }

    fn pop_block(&self) -> Result<Block, ChainError> {
        self.chain_state.write().pop_block()
    }

    fn push_transaction(&self, transaction: Transaction) -> Result<(), ChainError> {
        self.chain_state.write().push_transaction(transaction)
    }

    fn clear_pending(&self) -> Result<(), ChainError> {
        self.chain_state.write().clear_pending()
    }

    fn state_fingerprint(&self) -> Result<Hash, ChainError> {
        self.chain_state.read().fingerprint()
    }

    /// Returns a boxed clone of self.
    /// Allows cloning `Box<dyn ChainController>`,
    /// see `sigma-chain-exports/controller_traits.rs`
    fn clone_box(&self) -> Box<dyn ChainController> {
        Box::new(self.clone())
    }
}

/// Creates the genesis state described by `config` and returns a controller
/// sharing it
pub fn start_chain_controller(config: ChainConfig) -> Result<Box<dyn ChainController>, ChainError> {
    let chain_state = ChainState::new(config)?;
    info!("chain started at block {}", chain_state.head_block_num());
    Ok(Box::new(ChainControllerImpl {
        chain_state: Arc::new(RwLock::new(chain_state)),
    }))
}
