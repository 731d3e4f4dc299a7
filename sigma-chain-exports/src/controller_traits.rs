// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::error::ChainError;
use crate::objects::{AccountObject, DynamicGlobalPropertyObject};
use crate::types::AppliedOperation;
use sigma_hash::Hash;
use sigma_models::{AccountName, Block, Transaction};

/// Trait defining a chain controller.
///
/// Mutating calls hold exclusive access to the state for their whole
/// duration, so queries never observe a partially applied block.
///
/// Queries do observe the pending state: transactions accepted by
/// `push_transaction` stay visible until the next `push_block`, `pop_block`
/// or `clear_pending`, so block producers can read what they are about to
/// include. Such transactions are always applied in full, never in part.
pub trait ChainController: Send + Sync {
    /// number of the head block
    fn head_block_num(&self) -> u32;

    /// copy of the global state record
    fn get_global_state(&self) -> Result<DynamicGlobalPropertyObject, ChainError>;

    /// account by name
    fn get_account(&self, name: &AccountName) -> Result<Option<AccountObject>, ChainError>;

    /// applied operations of a block, in application order
    fn get_applied_operations(
        &self,
        block_num: u32,
        only_virtual: bool,
    ) -> Result<Vec<AppliedOperation>, ChainError>;

    /// applies a block on top of the head
    fn push_block(&self, block: Block) -> Result<(), ChainError>;

    /// undoes the head block and returns it
    fn pop_block(&self) -> Result<Block, ChainError>;

    /// applies a transaction on top of the head, outside any block
    fn push_transaction(&self, transaction: Transaction) -> Result<(), ChainError>;

    /// undoes every transaction applied through `push_transaction`
    fn clear_pending(&self) -> Result<(), ChainError>;

    /// hash of the whole chain state
    fn state_fingerprint(&self) -> Result<Hash, ChainError>;

    /// Returns a boxed clone of self.
    /// Useful to allow cloning `Box<dyn ChainController>`.
    fn clone_box(&self) -> Box<dyn ChainController>;
}

/// Allow cloning `Box<dyn ChainController>`
/// Uses `ChainController::clone_box` internally
impl Clone for Box<dyn ChainController> {
    fn clone(&self) -> Box<dyn ChainController> {
        self.clone_box()
    }
}
