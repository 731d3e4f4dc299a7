// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::EvaluationContext;
use crate::evaluator::evaluate;
use crate::global_state::get_global_state;
use crate::recorder::Recorder;
use sigma_chain_exports::objects::{
    AccountObject, BlockSummaryObject, TransactionObject, ACCOUNT_BY_NAME, BLOCK_SUMMARY_BY_SLOT,
    TRANSACTION_BY_TRX_ID,
};
use sigma_chain_exports::{ChainConfig, ChainError, OperationCoordinates};
use sigma_chainbase::Database;
use sigma_logging::sigma_trace;
use sigma_models::{AccountName, Transaction, TransactionId};
use sigma_time::SigmaTime;
use std::convert::TryFrom;
use tracing::debug;

/// Lifecycle of a transaction in the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    /// received, no session open
    Pending,
    /// session open, operations being evaluated
    Validating,
    /// session merged into the enclosing one
    Applied,
    /// session discarded
    Rejected,
}

/// Block being applied, as seen by its transactions
#[derive(Debug, Clone)]
pub(crate) struct BlockEnvironment {
    /// number of the block
    pub block_num: u32,
    /// block time
    pub timestamp: SigmaTime,
    /// block producer
    pub producer: AccountName,
}

/// Applies `transaction` in its own session on top of `db`.
///
/// On success the session is merged into the enclosing scope. On any error
/// the session is discarded, leaving `db` exactly as it was, and the error is
/// returned.
pub(crate) fn apply_transaction(
    db: &mut Database,
    config: &ChainConfig,
    recorder: &mut Recorder,
    env: &BlockEnvironment,
    transaction: &Transaction,
    trx_in_block: u32,
) -> Result<TransactionId, ChainError> {
    let trx_id = transaction.id()?;
    let mut state = TransactionState::Pending;
    trace_state(&trx_id, state);

    let mut session = db.start_session();
    state = TransactionState::Validating;
    trace_state(&trx_id, state);
    let outcome = validate_and_apply(
        &mut session,
        config,
        recorder,
        env,
        transaction,
        trx_id,
        trx_in_block,
    );
    match outcome {
        Ok(()) => {
            session.commit()?;
            state = TransactionState::Applied;
            trace_state(&trx_id, state);
            Ok(trx_id)
        }
        Err(err) => {
            session.discard()?;
            state = TransactionState::Rejected;
            trace_state(&trx_id, state);
            debug!("transaction {} rejected: {}", trx_id, err);
            Err(err)
        }
    }
}

fn trace_state(trx_id: &TransactionId, state: TransactionState) {
    sigma_trace!("chain.dispatcher.transaction_state", {
        "trx_id": trx_id.to_string(),
        "state": format!("{:?}", state)
    });
}

fn validate_and_apply(
    db: &mut Database,
    config: &ChainConfig,
    recorder: &mut Recorder,
    env: &BlockEnvironment,
    transaction: &Transaction,
    trx_id: TransactionId,
    trx_in_block: u32,
) -> Result<(), ChainError> {
    check_transaction(db, config, transaction, &trx_id)?;
    db.create(|id| TransactionObject {
        id,
        trx_id,
        expiration: transaction.expiration,
    })?;

    for (index, op) in transaction.operations.iter().enumerate() {
        let op_in_trx = u16::try_from(index).map_err(|_| {
            ChainError::InvalidOperation("too many operations in transaction".to_string())
        })?;
        let coordinates = OperationCoordinates {
            trx_id,
            block: env.block_num,
            trx_in_block,
            op_in_trx,
            timestamp: env.timestamp,
        };
        // signer operations precede the virtual operations they trigger
        recorder.record(db, op.clone(), &coordinates, false)?;
        let mut ctx = EvaluationContext {
            db: &mut *db,
            config,
            recorder: &mut *recorder,
            approvals: &transaction.approvals,
            signing_keys: &transaction.signing_keys,
            coordinates,
            producer: env.producer.clone(),
        };
        evaluate(&mut ctx, op)?;
    }

    for approval in &transaction.approvals {
        let id = db
            .get_by(ACCOUNT_BY_NAME, &AccountObject::name_key(&approval.account))?
            .id;
        db.modify(id, |account| account.last_activity_time = env.timestamp)?;
    }
    Ok(())
}

/// Checks that do not depend on the operations themselves
fn check_transaction(
    db: &Database,
    config: &ChainConfig,
    transaction: &Transaction,
    trx_id: &TransactionId,
) -> Result<(), ChainError> {
    if transaction.operations.is_empty() {
        return Err(ChainError::InvalidOperation(
            "transaction has no operation".to_string(),
        ));
    }
    if let Some(op) = transaction.operations.iter().find(|op| op.is_virtual()) {
        return Err(ChainError::InvalidOperation(format!(
            "virtual operation {} cannot be signed",
            op.name()
        )));
    }
    let size = transaction.serialized_size()?;
    if size > config.max_transaction_size as usize {
        return Err(ChainError::InvalidOperation(format!(
            "transaction of {} bytes exceeds the limit of {}",
            size, config.max_transaction_size
        )));
    }

    let head_time = get_global_state(db)?.time;
    if transaction.expiration <= head_time {
        return Err(ChainError::InvalidOperation(format!(
            "transaction expired at {}",
            transaction.expiration
        )));
    }
    if transaction.expiration > head_time.saturating_add(config.max_time_until_expiration) {
        return Err(ChainError::InvalidOperation(format!(
            "transaction expiration {} is too far in the future",
            transaction.expiration
        )));
    }

    let summary = db.find_by(
        BLOCK_SUMMARY_BY_SLOT,
        &BlockSummaryObject::slot_key(transaction.ref_block_num),
    )?;
    match summary {
        Some(summary) if summary.block_id.ref_prefix() == transaction.ref_block_prefix => {}
        _ => {
            return Err(ChainError::InvalidOperation(format!(
                "transaction references unknown block {} with prefix {}",
                transaction.ref_block_num, transaction.ref_block_prefix
            )))
        }
    }

    if db
        .find_by(TRANSACTION_BY_TRX_ID, &TransactionObject::trx_key(trx_id))?
        .is_some()
    {
        return Err(ChainError::ConstraintViolation(format!(
            "duplicate transaction {}",
            trx_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{FillMiningRewardOperation, TransferOperation};
    use sigma_models::{Amount, Operation};
    use sigma_time::SigmaTime;

    fn transfer(amount: u64) -> Operation {
        Operation::Transfer(TransferOperation {
            from: account("sigmaengine"),
            to: account("sgt.swap"),
            amount: Amount::from_mantissa_scale(amount, 0),
            memo: String::new(),
        })
    }

    #[test]
    #[serial]
    fn transaction_checks() {
        let mut chain = TestChain::new();
        let approvals = [active("sigmaengine")];

        let empty = chain.transaction(vec![], &approvals);
        assert_matches!(chain.push_block(vec![empty]), Err(ChainError::InvalidOperation(_)));

        let forged = chain.transaction(
            vec![Operation::FillMiningReward(FillMiningRewardOperation {
                account: account("sigmaengine"),
                reward: Amount::from_mantissa_scale(1, 0),
            })],
            &approvals,
        );
        assert_matches!(chain.push_block(vec![forged]), Err(ChainError::InvalidOperation(_)));

        let mut expired = chain.transaction(vec![transfer(1)], &approvals);
        expired.expiration = chain.global().time;
        assert_matches!(chain.push_block(vec![expired]), Err(ChainError::InvalidOperation(_)));

        let mut far = chain.transaction(vec![transfer(1)], &approvals);
        far.expiration = chain
            .global()
            .time
            .saturating_add(chain.config.max_time_until_expiration)
            .saturating_add(SigmaTime::from_secs(1));
        assert_matches!(chain.push_block(vec![far]), Err(ChainError::InvalidOperation(_)));

        let mut bad_tapos = chain.transaction(vec![transfer(1)], &approvals);
        bad_tapos.ref_block_prefix ^= 1;
        assert_matches!(
            chain.push_block(vec![bad_tapos]),
            Err(ChainError::InvalidOperation(_))
        );

        let valid = chain.transaction(vec![transfer(1)], &approvals);
        assert_matches!(
            chain.push_block(vec![valid.clone(), valid]),
            Err(ChainError::ConstraintViolation(_))
        );
        assert_eq!(chain.global().head_block_number, 0);
    }

    #[test]
    #[serial]
    fn failing_operation_discards_the_whole_transaction() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        let before = chain.fingerprint();
        let pool_before = chain.account("sgt.reward").balance;

        let trx = chain.transaction(
            vec![
                Operation::Transfer(TransferOperation {
                    from: account("alice"),
                    to: account("sigmaengine"),
                    amount: Amount::from_mantissa_scale(60, 0),
                    memo: String::new(),
                }),
                Operation::Transfer(TransferOperation {
                    from: account("alice"),
                    to: account("sigmaengine"),
                    amount: Amount::from_mantissa_scale(60, 0),
                    memo: String::new(),
                }),
            ],
            &[active("alice")],
        );
        assert_matches!(
            chain.state.push_transaction(trx),
            Err(ChainError::InvalidOperation(_))
        );
        chain.state.clear_pending().unwrap();
        assert_eq!(chain.fingerprint(), before);
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(100, 0));
        assert_eq!(chain.account("sgt.reward").balance, pool_before);
    }

    #[test]
    #[serial]
    fn pending_transactions_are_cleared() {
        let mut chain = TestChain::new();
        let before = chain.fingerprint();
        let trx = chain.transaction(vec![transfer(7)], &[active("sigmaengine")]);
        chain.state.push_transaction(trx.clone()).unwrap();
        assert_eq!(chain.account("sgt.swap").balance, Amount::from_mantissa_scale(7, 0));
        assert_matches!(
            chain.state.push_transaction(trx),
            Err(ChainError::ConstraintViolation(_))
        );
        chain.state.clear_pending().unwrap();
        assert_eq!(chain.account("sgt.swap").balance, Amount::zero());
        assert_eq!(chain.fingerprint(), before);
    }
}
