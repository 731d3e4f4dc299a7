// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::chain_state::ChainState;
use sigma_chain_exports::objects::{
    AccountObject, AccountRecoveryRequestObject, BobserverObject, DynamicGlobalPropertyObject,
    FundObject, BOBSERVER_BY_NAME, FUND_BY_NAME,
};
use sigma_chain_exports::test_exports::{account, active, key_authority, test_chain_config, test_public_key};
use sigma_chain_exports::{AppliedOperation, ChainConfig, ChainError};
use sigma_hash::Hash;
use sigma_models::operation::{
    AccountCreateOperation, BobserverUpdateOperation, PrintOperation, UpdateBproducerOperation,
};
use sigma_models::{Amount, Approval, Block, Operation, PublicKey, Transaction};
use sigma_time::SigmaTime;
use std::collections::BTreeSet;
use tracing_subscriber::filter::LevelFilter;

/// Chain state with helpers producing blocks on top of its head
pub(crate) struct TestChain {
    pub config: ChainConfig,
    pub state: ChainState,
}

impl TestChain {
    pub fn new() -> Self {
        Self::with_config(test_chain_config())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        // several tests share the process, only the first one installs the subscriber
        let _ = tracing_subscriber::fmt()
            .with_max_level(LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
        let state = ChainState::new(config.clone()).expect("genesis failed");
        TestChain { config, state }
    }

    pub fn global(&self) -> DynamicGlobalPropertyObject {
        self.state.global_state().expect("no global state").clone()
    }

    /// Transaction referencing the head block, expiring one minute after it
    pub fn transaction(&self, operations: Vec<Operation>, approvals: &[Approval]) -> Transaction {
        let global = self.global();
        Transaction {
            ref_block_num: (global.head_block_number & 0xffff) as u16,
            ref_block_prefix: global.head_block_id.ref_prefix(),
            expiration: global.time.saturating_add(SigmaTime::from_secs(60)),
            operations,
            approvals: approvals.iter().cloned().collect(),
            signing_keys: BTreeSet::new(),
        }
    }

    /// Block of `producer` on top of the head, `skipped_slots` slots after the
    /// next one
    pub fn block(&self, producer: &str, skipped_slots: u64, transactions: Vec<Transaction>) -> Block {
        let global = self.global();
        let timestamp = global
            .time
            .checked_add(
                self.config
                    .block_interval
                    .checked_mul(skipped_slots + 1)
                    .unwrap(),
            )
            .unwrap();
        Block::new(global.head_block_id, timestamp, account(producer), transactions).unwrap()
    }

    /// Pushes a root-produced block holding `transactions`, returns its number
    pub fn push_block(&mut self, transactions: Vec<Transaction>) -> Result<u32, ChainError> {
        let block = self.block("sigmaengine", 0, transactions);
        let block_num = block.block_num().unwrap();
        self.state.push_block(block)?;
        Ok(block_num)
    }

    /// Applies `operations` in a one-transaction block
    pub fn apply(&mut self, operations: Vec<Operation>, approvals: &[Approval]) -> Result<u32, ChainError> {
        let transaction = self.transaction(operations, approvals);
        self.push_block(vec![transaction])
    }

    /// Applies `operations` in a one-transaction block signed with `keys`
    pub fn apply_signed(
        &mut self,
        operations: Vec<Operation>,
        approvals: &[Approval],
        keys: &[PublicKey],
    ) -> Result<u32, ChainError> {
        let mut transaction = self.transaction(operations, approvals);
        transaction.signing_keys = keys.iter().cloned().collect();
        self.push_block(vec![transaction])
    }

    /// Pushes `count` empty blocks, returns the number of the last one
    pub fn skip_blocks(&mut self, count: u32) -> u32 {
        let mut last = self.state.head_block_num();
        for _ in 0..count {
            last = self.push_block(Vec::new()).unwrap();
        }
        last
    }

    /// Root creates `name` with a single key per authority level, funded
    /// with `amount` through the creation fee
    pub fn create_account(&mut self, name: &str, amount: Amount) {
        let create = Operation::AccountCreate(AccountCreateOperation {
            fee: amount,
            creator: account("sigmaengine"),
            new_account_name: account(name),
            owner: key_authority(name),
            active: key_authority(name),
            posting: key_authority(name),
            memo_key: test_public_key(name),
            json_metadata: String::new(),
        });
        self.apply(vec![create], &[active("sigmaengine")]).unwrap();
    }

    pub fn print(&mut self, name: &str, amount: Amount) {
        let print = Operation::Print(PrintOperation {
            account: account(name),
            amount,
        });
        self.apply(vec![print], &[active("sigmaengine")]).unwrap();
    }

    pub fn register_bobserver(&mut self, name: &str) {
        let update = Operation::BobserverUpdate(BobserverUpdateOperation {
            owner: account(name),
            url: format!("https://{}.sigmaengine.io", name),
            block_signing_key: test_public_key(name),
            maximum_block_size: self.config.initial_maximum_block_size,
        });
        self.apply(vec![update], &[active(name)]).unwrap();
    }

    pub fn approve_bproducer(&mut self, name: &str) {
        let approve = Operation::UpdateBproducer(UpdateBproducerOperation {
            bobserver: account(name),
            approve: true,
        });
        self.apply(vec![approve], &[active("sigmaengine")]).unwrap();
    }

    pub fn account(&self, name: &str) -> AccountObject {
        self.state
            .find_account(&account(name))
            .unwrap()
            .expect("unknown account")
            .clone()
    }

    pub fn bobserver(&self, name: &str) -> BobserverObject {
        self.state
            .database()
            .get_by(BOBSERVER_BY_NAME, &BobserverObject::name_key(&account(name)))
            .unwrap()
            .clone()
    }

    pub fn fund(&self, name: &str) -> FundObject {
        self.state
            .database()
            .get_by(FUND_BY_NAME, &FundObject::name_key(name))
            .unwrap()
            .clone()
    }

    pub fn recovery_request_count(&self) -> usize {
        self.state
            .database()
            .count::<AccountRecoveryRequestObject>()
            .unwrap()
    }

    pub fn applied_operations(&self, block_num: u32) -> Vec<AppliedOperation> {
        self.state.applied_operations(block_num, false).unwrap()
    }

    pub fn virtual_operations(&self, block_num: u32) -> Vec<AppliedOperation> {
        self.state.applied_operations(block_num, true).unwrap()
    }

    pub fn fingerprint(&self) -> Hash {
        self.state.fingerprint().unwrap()
    }
}
