// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use super::tools::TestChain;
use crate::dispatcher::{apply_transaction, BlockEnvironment};
use crate::recorder::Recorder;
use crate::start_chain_controller;
use assert_matches::assert_matches;
use serial_test::serial;
use sigma_chain_exports::objects::{AccountObject, DynamicGlobalPropertyObject, ACCOUNT_BY_NAME};
use sigma_chain_exports::test_exports::{account, active, key_authority, test_chain_config, test_public_key};
use sigma_chain_exports::{ChainController, ChainError};
use sigma_models::operation::{AccountCreateOperation, TransferOperation};
use sigma_models::{Amount, Block, Operation, Transaction};
use sigma_time::SigmaTime;

fn transfer(from: &str, to: &str, amount: u64) -> Operation {
    Operation::Transfer(TransferOperation {
        from: account(from),
        to: account(to),
        amount: Amount::from_mantissa_scale(amount, 0),
        memo: String::new(),
    })
}

fn create(name: &str, amount: u64) -> Operation {
    Operation::AccountCreate(AccountCreateOperation {
        fee: Amount::from_mantissa_scale(amount, 0),
        creator: account("sigmaengine"),
        new_account_name: account(name),
        owner: key_authority(name),
        active: key_authority(name),
        posting: key_authority(name),
        memo_key: test_public_key(name),
        json_metadata: String::new(),
    })
}

#[test]
#[serial]
fn failed_transfer_in_nested_session_keeps_the_parent_session() {
    let mut chain = TestChain::new();
    let config = chain.config.clone();
    let global = chain.global();
    let env = BlockEnvironment {
        block_num: 1,
        timestamp: global.time,
        producer: global.current_bobserver,
    };
    let create_alice = chain.transaction(vec![create("alice", 100)], &[active("sigmaengine")]);
    let pay_bob = chain.transaction(vec![transfer("alice", "bob", 30)], &[active("alice")]);
    let mut recorder = Recorder::default();

    let db = chain.state.database_mut();
    let mut outer = db.start_session();
    apply_transaction(&mut outer, &config, &mut recorder, &env, &create_alice, 0).unwrap();
    assert_matches!(
        apply_transaction(&mut outer, &config, &mut recorder, &env, &pay_bob, 1),
        Err(ChainError::InvalidOperation(_))
    );
    let alice = outer
        .get_by(ACCOUNT_BY_NAME, &AccountObject::name_key(&account("alice")))
        .unwrap();
    assert_eq!(alice.balance, Amount::from_mantissa_scale(100, 0));
    outer.commit().unwrap();

    assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(100, 0));
    assert!(chain.state.find_account(&account("bob")).unwrap().is_none());
    assert_eq!(chain.state.database().revision(), 0);
}

#[test]
#[serial]
fn rejected_block_leaves_the_state_bit_identical() {
    let mut chain = TestChain::new();
    chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
    let before = chain.fingerprint();
    let head = chain.global().head_block_number;

    let good = chain.transaction(vec![transfer("alice", "sigmaengine", 10)], &[active("alice")]);
    let bad = chain.transaction(
        vec![create("bob", 1), transfer("alice", "sigmaengine", 1000)],
        &[active("sigmaengine"), active("alice")],
    );
    assert_matches!(
        chain.push_block(vec![good, bad]),
        Err(ChainError::InvalidOperation(_))
    );
    assert_eq!(chain.fingerprint(), before);
    assert_eq!(chain.global().head_block_number, head);
    assert!(chain.state.find_account(&account("bob")).unwrap().is_none());
    assert!(chain.applied_operations(head + 1).is_empty());
}

#[test]
#[serial]
fn exactly_one_global_state_record() {
    let mut chain = TestChain::new();
    let count = |chain: &TestChain| {
        chain
            .state
            .database()
            .count::<DynamicGlobalPropertyObject>()
            .unwrap()
    };
    assert_eq!(count(&chain), 1);
    chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
    chain.skip_blocks(3);
    assert_eq!(count(&chain), 1);
    let _ = chain.apply(vec![transfer("alice", "nobody", 1)], &[active("alice")]);
    assert_eq!(count(&chain), 1);
    chain.state.pop_block().unwrap_err();
    assert_eq!(count(&chain), 1);
}

#[test]
#[serial]
fn same_blocks_give_the_same_state() {
    let mut first = TestChain::new();
    let mut second = TestChain::new();
    assert_eq!(first.fingerprint(), second.fingerprint());

    let mut blocks: Vec<Block> = Vec::new();
    let trx = first.transaction(vec![create("alice", 50)], &[active("sigmaengine")]);
    blocks.push(first.block("sigmaengine", 0, vec![trx]));
    first.state.push_block(blocks[0].clone()).unwrap();
    let trx = first.transaction(
        vec![transfer("alice", "sigmaengine", 5), transfer("sigmaengine", "alice", 1)],
        &[active("alice"), active("sigmaengine")],
    );
    blocks.push(first.block("sigmaengine", 2, vec![trx]));
    first.state.push_block(blocks[1].clone()).unwrap();

    for block in blocks {
        second.state.push_block(block).unwrap();
    }
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.global(), second.global());
    for block_num in 1..=2 {
        assert_eq!(
            first.applied_operations(block_num),
            second.applied_operations(block_num)
        );
    }
}

#[test]
#[serial]
fn consistency_fault_halts_the_chain() {
    let mut chain = TestChain::new();
    let block = chain.block("sigmaengine", 0, vec![]);
    let later = chain.block("sigmaengine", 1, vec![]);
    let trx = chain.transaction(vec![transfer("sigmaengine", "sgt.swap", 1)], &[active("sigmaengine")]);

    let id = chain.global().id;
    chain.state.database_mut().remove(id).unwrap();
    assert_matches!(
        chain.state.push_block(block),
        Err(ChainError::ConsistencyFault(_))
    );
    assert_matches!(chain.state.halted(), Some(ChainError::ConsistencyFault(_)));
    assert_matches!(
        chain.state.push_block(later),
        Err(ChainError::ConsistencyFault(_))
    );
    assert_matches!(
        chain.state.push_transaction(trx),
        Err(ChainError::ConsistencyFault(_))
    );
    assert_matches!(chain.state.pop_block(), Err(ChainError::ConsistencyFault(_)));
    assert_eq!(chain.state.head_block_num(), 0);
}

#[test]
#[serial]
fn controller_shares_the_chain_state() {
    let controller = start_chain_controller(test_chain_config()).unwrap();
    let writer = controller.clone();
    let genesis = controller.state_fingerprint().unwrap();

    let global = controller.get_global_state().unwrap();
    let block = Block::new(
        global.head_block_id,
        global
            .time
            .saturating_add(test_chain_config().block_interval),
        account("sigmaengine"),
        vec![],
    )
    .unwrap();
    let handle = std::thread::spawn(move || writer.push_block(block));
    handle.join().unwrap().unwrap();

    assert_eq!(controller.head_block_num(), 1);
    assert_eq!(controller.get_global_state().unwrap().head_block_number, 1);
    assert_ne!(controller.state_fingerprint().unwrap(), genesis);
    assert!(controller
        .get_account(&account("sigmaengine"))
        .unwrap()
        .is_some());
    assert!(controller.get_account(&account("nobody")).unwrap().is_none());
    assert!(controller.get_applied_operations(1, false).unwrap().is_empty());
    // a single producer makes every block irreversible at once
    assert_matches!(controller.pop_block(), Err(ChainError::InvalidOperation(_)));
    controller.clear_pending().unwrap();
}

#[test]
#[serial]
fn controller_queries_include_pending_transactions() {
    let controller = start_chain_controller(test_chain_config()).unwrap();
    let global = controller.get_global_state().unwrap();
    let trx = Transaction {
        ref_block_num: (global.head_block_number & 0xffff) as u16,
        ref_block_prefix: global.head_block_id.ref_prefix(),
        expiration: global.time.saturating_add(SigmaTime::from_secs(60)),
        operations: vec![transfer("sigmaengine", "sgt.swap", 4)],
        approvals: [active("sigmaengine")].into_iter().collect(),
        signing_keys: Default::default(),
    };
    let swap_balance = |controller: &dyn ChainController| {
        controller
            .get_account(&account("sgt.swap"))
            .unwrap()
            .unwrap()
            .balance
    };
    let before = controller.state_fingerprint().unwrap();
    assert_eq!(swap_balance(controller.as_ref()), Amount::from_mantissa_scale(0, 0));

    controller.push_transaction(trx).unwrap();
    assert_eq!(swap_balance(controller.as_ref()), Amount::from_mantissa_scale(4, 0));
    assert_eq!(controller.head_block_num(), 0);

    controller.clear_pending().unwrap();
    assert_eq!(swap_balance(controller.as_ref()), Amount::from_mantissa_scale(0, 0));
    assert_eq!(controller.state_fingerprint().unwrap(), before);
}
