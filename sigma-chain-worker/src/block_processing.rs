// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::dispatcher::{apply_transaction, BlockEnvironment};
use crate::evaluators::bobserver::active_bproducers;
use crate::genesis::PARTICIPATION_SLOTS;
use crate::global_state::{get_global_state, update_global_state};
use crate::recorder::Recorder;
use sigma_chain_exports::objects::{
    AccountObject, AccountRecoveryRequestObject, BlockSummaryObject, BobserverObject,
    ChangeRecoveryAccountRequestObject, DeclineVotingRightsRequestObject, TransactionObject,
    ACCOUNT_BY_NAME, BLOCK_SUMMARY_BY_SLOT, BOBSERVER_BY_NAME, CHANGE_RECOVERY_BY_EFFECTIVE_DATE,
    DECLINE_VOTING_BY_EFFECTIVE_DATE, RECOVERY_REQUEST_BY_EXPIRATION, TRANSACTION_BY_EXPIRATION,
};
use sigma_chain_exports::{ChainConfig, ChainError, OperationCoordinates};
use sigma_chainbase::{Database, ObjectId};
use sigma_models::operation::FillChangeRecoveryAccountOperation;
use sigma_models::{Block, BlockId, Operation, TransactionId};
use sigma_time::SigmaTime;
use std::convert::TryFrom;
use tracing::{debug, info};

/// Applies `block` on top of the head of `db`: block checks, transactions in
/// order, then the end-of-block bookkeeping.
///
/// The caller owns the session: any error leaves partial changes in `db`.
pub(crate) fn apply_block(
    db: &mut Database,
    config: &ChainConfig,
    recorder: &mut Recorder,
    block: &Block,
    block_id: BlockId,
) -> Result<(), ChainError> {
    let block_num = block_id.block_num();
    check_block(db, config, block)?;

    recorder.start_block();
    let env = BlockEnvironment {
        block_num,
        timestamp: block.header.timestamp,
        producer: block.header.bobserver.clone(),
    };
    for (index, transaction) in block.transactions.iter().enumerate() {
        apply_transaction(db, config, recorder, &env, transaction, to_u32(index)?)?;
    }

    let now = block.header.timestamp;
    update_block_summary(db, block_id)?;
    let aslot = update_global_dynamic_data(db, config, block, block_id)?;
    update_signing_bobserver(db, block, block_num, aslot)?;
    update_maximum_block_size(db, config, block_num)?;
    refresh_transaction_fee(db, config, block_num)?;
    clear_expired_transactions(db, now)?;
    clear_expired_recovery_requests(db, now)?;
    // maturations are logged after the last transaction of the block
    let coordinates = OperationCoordinates {
        trx_id: TransactionId::zero(),
        block: block_num,
        trx_in_block: to_u32(block.transactions.len())?,
        op_in_trx: 0,
        timestamp: now,
    };
    process_recovery_account_changes(db, recorder, &coordinates)?;
    process_decline_voting_rights(db, now)?;
    update_last_irreversible_block(db, config)
}

fn to_u32(value: usize) -> Result<u32, ChainError> {
    u32::try_from(value).map_err(|err| ChainError::InvalidOperation(err.to_string()))
}

fn check_block(db: &Database, config: &ChainConfig, block: &Block) -> Result<(), ChainError> {
    let global = get_global_state(db)?;
    let header = &block.header;
    if header.previous != global.head_block_id {
        return Err(ChainError::InvalidOperation(format!(
            "block parent {} is not the head {}",
            header.previous, global.head_block_id
        )));
    }
    if header.timestamp <= global.time {
        return Err(ChainError::InvalidOperation(format!(
            "block time {} is not after the head time {}",
            header.timestamp, global.time
        )));
    }
    let since_genesis = header
        .timestamp
        .checked_sub(config.genesis_time)
        .map_err(|err| ChainError::InvalidOperation(err.to_string()))?;
    let offset = since_genesis
        .checked_rem_time(config.block_interval)
        .map_err(|err| ChainError::InvalidOperation(err.to_string()))?;
    if offset.to_millis() != 0 {
        return Err(ChainError::InvalidOperation(format!(
            "block time {} is not on a slot boundary",
            header.timestamp
        )));
    }

    let producer = db.find_by(
        BOBSERVER_BY_NAME,
        &BobserverObject::name_key(&header.bobserver),
    )?;
    if !matches!(producer, Some(bobserver) if bobserver.is_bproducer) {
        return Err(ChainError::Unauthorized(format!(
            "{} is not an active block producer",
            header.bobserver
        )));
    }

    if block.compute_merkle_root()? != header.transaction_merkle_root {
        return Err(ChainError::InvalidOperation(
            "transaction merkle root mismatch".to_string(),
        ));
    }
    let size = block.serialized_size()?;
    if size > global.maximum_block_size as usize {
        return Err(ChainError::InvalidOperation(format!(
            "block of {} bytes exceeds the maximum block size of {}",
            size, global.maximum_block_size
        )));
    }
    if block.transactions.len() > config.max_transactions_per_block as usize {
        return Err(ChainError::InvalidOperation(format!(
            "block holds {} transactions, more than {}",
            block.transactions.len(),
            config.max_transactions_per_block
        )));
    }
    Ok(())
}

/// Block summaries form a ring addressed by the low 16 bits of the block number
fn update_block_summary(db: &mut Database, block_id: BlockId) -> Result<(), ChainError> {
    let slot = (block_id.block_num() & 0xffff) as u16;
    let existing = db
        .find_by(BLOCK_SUMMARY_BY_SLOT, &BlockSummaryObject::slot_key(slot))?
        .map(|summary| summary.id);
    match existing {
        Some(id) => db.modify(id, |summary| summary.block_id = block_id)?,
        None => {
            db.create(|id| BlockSummaryObject { id, slot, block_id })?;
        }
    }
    Ok(())
}

/// Shifts one slot into the participation window
fn shift_slot(filled: &mut u128, count: &mut u8, slot_filled: bool) {
    if *filled >> 127 == 1 {
        *count = count.saturating_sub(1);
    }
    *filled = (*filled << 1) | u128::from(slot_filled);
    if slot_filled {
        *count = count.saturating_add(1);
    }
}

/// Moves the head to `block` and returns its absolute slot
fn update_global_dynamic_data(
    db: &mut Database,
    config: &ChainConfig,
    block: &Block,
    block_id: BlockId,
) -> Result<u64, ChainError> {
    let global = get_global_state(db)?;
    let aslot = config.slot_at(block.header.timestamp);
    let missed = aslot
        .saturating_sub(global.current_aslot)
        .saturating_sub(1);
    let mut filled = global.recent_slots_filled;
    let mut count = global.participation_count;
    for _ in 0..missed.min(u64::from(PARTICIPATION_SLOTS)) {
        shift_slot(&mut filled, &mut count, false);
    }
    shift_slot(&mut filled, &mut count, true);
    if missed > 0 {
        debug!("{} slots missed before block {}", missed, block_id.block_num());
    }

    let producer = block.header.bobserver.clone();
    update_global_state(db, |global| {
        global.head_block_number = block_id.block_num();
        global.head_block_id = block_id;
        global.time = block.header.timestamp;
        global.current_bobserver = producer;
        global.current_aslot = aslot;
        global.recent_slots_filled = filled;
        global.participation_count = count;
    })?;
    Ok(aslot)
}

fn update_signing_bobserver(
    db: &mut Database,
    block: &Block,
    block_num: u32,
    aslot: u64,
) -> Result<(), ChainError> {
    let id = db
        .get_by(
            BOBSERVER_BY_NAME,
            &BobserverObject::name_key(&block.header.bobserver),
        )?
        .id;
    db.modify(id, |bobserver| {
        bobserver.last_confirmed_block_num = block_num;
        bobserver.last_aslot = aslot;
    })?;
    Ok(())
}

/// Median of the active producers proposals, once per round
fn update_maximum_block_size(
    db: &mut Database,
    config: &ChainConfig,
    block_num: u32,
) -> Result<(), ChainError> {
    if block_num.checked_rem(config.max_bproducers).unwrap_or(0) != 0 {
        return Ok(());
    }
    let mut sizes: Vec<u32> = active_bproducers(db)?
        .iter()
        .map(|bobserver| bobserver.proposed_maximum_block_size)
        .collect();
    if sizes.is_empty() {
        return Ok(());
    }
    sizes.sort_unstable();
    let size = sizes[sizes.len() / 2]
        .max(config.min_block_size_limit)
        .min(config.max_block_size_limit);
    if size == get_global_state(db)?.maximum_block_size {
        return Ok(());
    }
    update_global_state(db, |global| global.maximum_block_size = size)?;
    info!("maximum block size set to {} at block {}", size, block_num);
    Ok(())
}

/// Sets the transaction fee to the median vote of the active producers every
/// `refresh_transaction_fee_cycle` blocks
fn refresh_transaction_fee(
    db: &mut Database,
    config: &ChainConfig,
    block_num: u32,
) -> Result<(), ChainError> {
    let global = get_global_state(db)?;
    if block_num != global.next_refresh_transaction_fee_block {
        return Ok(());
    }
    let next = block_num
        .checked_add(global.refresh_transaction_fee_cycle)
        .ok_or_else(|| {
            ChainError::ConsistencyFault("fee refresh block number overflows".to_string())
        })?;
    let mut votes: Vec<_> = active_bproducers(db)?
        .iter()
        .map(|bobserver| bobserver.transaction_fee_vote)
        .collect();
    votes.sort_unstable();
    let fee = votes
        .get(votes.len() / 2)
        .copied()
        .unwrap_or(global.transaction_fee)
        .max(config.min_transaction_fee)
        .min(config.max_transaction_fee);
    let transfers = global.total_transfer;

    update_global_state(db, |global| {
        global.transaction_fee = fee;
        global.prev_refresh_transaction_fee_block = block_num;
        global.next_refresh_transaction_fee_block = next;
        global.total_transfer = 0;
    })?;
    info!(
        "transaction fee refreshed at block {} to {} after {} transfers",
        block_num, fee, transfers
    );
    Ok(())
}

/// Transaction ids are kept for duplicate detection until they expire
fn clear_expired_transactions(db: &mut Database, now: SigmaTime) -> Result<(), ChainError> {
    let expired: Vec<ObjectId<TransactionObject>> = db
        .iter_by(TRANSACTION_BY_EXPIRATION)?
        .take_while(|transaction| transaction.expiration <= now)
        .map(|transaction| transaction.id)
        .collect();
    for id in expired {
        db.remove(id)?;
    }
    Ok(())
}

fn clear_expired_recovery_requests(db: &mut Database, now: SigmaTime) -> Result<(), ChainError> {
    let expired: Vec<ObjectId<AccountRecoveryRequestObject>> = db
        .iter_by(RECOVERY_REQUEST_BY_EXPIRATION)?
        .take_while(|request| request.expires <= now)
        .map(|request| request.id)
        .collect();
    for id in expired {
        db.remove(id)?;
    }
    Ok(())
}

fn process_recovery_account_changes(
    db: &mut Database,
    recorder: &mut Recorder,
    coordinates: &OperationCoordinates,
) -> Result<(), ChainError> {
    let matured: Vec<ChangeRecoveryAccountRequestObject> = db
        .iter_by(CHANGE_RECOVERY_BY_EFFECTIVE_DATE)?
        .take_while(|request| request.effective_on <= coordinates.timestamp)
        .cloned()
        .collect();
    for request in matured {
        let account = db.get_by(
            ACCOUNT_BY_NAME,
            &AccountObject::name_key(&request.account_to_recover),
        )?;
        let (id, old_recovery_account) = (account.id, account.recovery_account.clone());
        let new_recovery_account = request.recovery_account.clone();
        db.modify(id, |account| {
            account.recovery_account = new_recovery_account.clone()
        })?;
        db.remove(request.id)?;
        recorder.record(
            db,
            Operation::FillChangeRecoveryAccount(FillChangeRecoveryAccountOperation {
                account: request.account_to_recover,
                old_recovery_account,
                new_recovery_account,
            }),
            coordinates,
            true,
        )?;
    }
    Ok(())
}

fn process_decline_voting_rights(db: &mut Database, now: SigmaTime) -> Result<(), ChainError> {
    let matured: Vec<DeclineVotingRightsRequestObject> = db
        .iter_by(DECLINE_VOTING_BY_EFFECTIVE_DATE)?
        .take_while(|request| request.effective_date <= now)
        .cloned()
        .collect();
    for request in matured {
        let id = db
            .get_by(ACCOUNT_BY_NAME, &AccountObject::name_key(&request.account))?
            .id;
        db.modify(id, |account| account.can_vote = false)?;
        db.remove(request.id)?;
        debug!("{} declined its voting rights", request.account);
    }
    Ok(())
}

/// A block is irreversible once enough active producers confirmed a block at
/// or above it. The value never decreases.
fn update_last_irreversible_block(db: &mut Database, config: &ChainConfig) -> Result<(), ChainError> {
    let mut confirmed: Vec<u32> = active_bproducers(db)?
        .iter()
        .map(|bobserver| bobserver.last_confirmed_block_num)
        .collect();
    if confirmed.is_empty() {
        return Ok(());
    }
    confirmed.sort_unstable();
    let offset = config
        .irreversibility_offset(confirmed.len())
        .min(confirmed.len() - 1);
    let candidate = confirmed[offset];
    if candidate <= get_global_state(db)?.last_irreversible_block_num {
        return Ok(());
    }
    update_global_state(db, |global| global.last_irreversible_block_num = candidate)?;
    debug!("last irreversible block is now {}", candidate);
    Ok(())
}
