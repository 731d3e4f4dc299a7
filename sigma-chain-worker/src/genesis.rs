// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use sigma_chain_exports::objects::{
    register_tables, AccountObject, BlockSummaryObject, BobserverObject,
    DynamicGlobalPropertyObject, FundObject,
};
use sigma_chain_exports::{ChainConfig, ChainError};
use sigma_chainbase::Database;
use sigma_models::{AccountName, Amount, Authority, BlockId, PublicKey};
use sigma_time::SigmaTime;
use std::collections::BTreeMap;
use tracing::info;

/// Number of slots of the participation bitmask
pub(crate) const PARTICIPATION_SLOTS: u8 = 128;

/// Builds the initial chain state in an empty store.
///
/// Genesis mutations are made outside any session and cannot be undone.
/// The root account holds the initial supply and is the only block producer;
/// the mining reward pool and the swap account start empty and cannot sign.
pub(crate) fn init_genesis(db: &mut Database, config: &ChainConfig) -> Result<(), ChainError> {
    register_tables(db)?;
    let genesis_time = config.genesis_time;

    let root_authority = Authority::from_key(config.root_public_key.clone());
    create_account(
        db,
        config,
        &config.root_account,
        config.init_supply,
        root_authority,
        config.root_public_key.clone(),
    )?;
    for system_account in [&config.mining_reward_account, &config.swap_account] {
        // threshold 1 without members: nobody signs for system accounts
        let unusable = Authority {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::new(),
        };
        create_account(
            db,
            config,
            system_account,
            Amount::zero(),
            unusable,
            config.root_public_key.clone(),
        )?;
    }

    db.create(|id| BobserverObject {
        id,
        owner: config.root_account.clone(),
        url: String::new(),
        signing_key: config.root_public_key.clone(),
        proposed_maximum_block_size: config.initial_maximum_block_size,
        transaction_fee_vote: config.initial_transaction_fee,
        is_bproducer: true,
        is_excepted: false,
        last_confirmed_block_num: 0,
        last_aslot: 0,
        created: genesis_time,
    })?;

    db.create(|id| FundObject {
        id,
        name: config.genesis_fund_name.clone(),
        balance: Amount::zero(),
        withdraw_balance: Amount::zero(),
        interest_rates: BTreeMap::new(),
    })?;

    // lets transactions reference block 0 for TaPoS
    db.create(|id| BlockSummaryObject {
        id,
        slot: 0,
        block_id: BlockId::zero(),
    })?;

    db.create(|id| DynamicGlobalPropertyObject {
        id,
        head_block_number: 0,
        head_block_id: BlockId::zero(),
        time: genesis_time,
        current_bobserver: config.root_account.clone(),
        current_supply: config.init_supply,
        burned_supply: Amount::zero(),
        maximum_block_size: config.initial_maximum_block_size,
        current_aslot: 0,
        recent_slots_filled: u128::MAX,
        participation_count: PARTICIPATION_SLOTS,
        transaction_fee: config.initial_transaction_fee,
        dapp_transaction_fee: config.dapp_transaction_fee,
        last_irreversible_block_num: 0,
        current_bproducer_count: 1,
        total_transfer: 0,
        prev_refresh_transaction_fee_block: 0,
        next_refresh_transaction_fee_block: config.refresh_transaction_fee_cycle,
        refresh_transaction_fee_cycle: config.refresh_transaction_fee_cycle,
        mining_reward_account: config.mining_reward_account.clone(),
        swap_account: config.swap_account.clone(),
    })?;

    let started = genesis_time
        .format_instant()
        .map_err(|err| ChainError::ConsistencyFault(format!("genesis time: {}", err)))?;
    info!(
        "genesis initialized at {}: root {} with supply {}",
        started, config.root_account, config.init_supply
    );
    Ok(())
}

fn create_account(
    db: &mut Database,
    config: &ChainConfig,
    name: &AccountName,
    balance: Amount,
    authority: Authority,
    memo_key: PublicKey,
) -> Result<(), ChainError> {
    db.create(|id| AccountObject {
        id,
        name: name.clone(),
        balance,
        owner: authority.clone(),
        active: authority.clone(),
        posting: authority,
        memo_key,
        json_metadata: String::new(),
        recovery_account: config.root_account.clone(),
        reset_account: None,
        created: config.genesis_time,
        last_owner_update: SigmaTime::from_millis(0),
        last_account_update: config.genesis_time,
        last_account_recovery: SigmaTime::from_millis(0),
        last_activity_time: config.genesis_time,
        last_mining_time: SigmaTime::from_millis(0),
        can_vote: true,
        is_blacklisted: false,
        savings_withdraw_requests: 0,
        staking_requests: 0,
    })?;
    Ok(())
}
