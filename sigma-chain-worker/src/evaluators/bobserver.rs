// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{require_max_len, EvaluationContext};
use sigma_chain_exports::objects::{BobserverObject, BOBSERVER_BY_BPRODUCER, BOBSERVER_BY_NAME};
use sigma_chain_exports::ChainError;
use sigma_chainbase::Database;
use sigma_models::operation::{
    BobserverUpdateOperation, ExceptBobserverOperation, UpdateBproducerOperation,
    VoteTransactionFeeOperation,
};
use sigma_models::{AccountName, AuthorityLevel};
use std::convert::TryFrom;

fn get_bobserver<'a>(
    ctx: &'a EvaluationContext<'_>,
    owner: &AccountName,
) -> Result<&'a BobserverObject, ChainError> {
    ctx.db
        .find_by(BOBSERVER_BY_NAME, &BobserverObject::name_key(owner))?
        .ok_or_else(|| ChainError::NotFound(format!("bobserver {}", owner)))
}

/// Active block producers, ordered by name
pub(crate) fn active_bproducers(db: &Database) -> Result<Vec<&BobserverObject>, ChainError> {
    let prefix = BobserverObject::bproducer_prefix();
    let producers = db.iter_by_prefix(BOBSERVER_BY_BPRODUCER, &prefix)?.collect();
    Ok(producers)
}

fn refresh_bproducer_count(ctx: &mut EvaluationContext<'_>) -> Result<(), ChainError> {
    let count = u32::try_from(active_bproducers(&*ctx.db)?.len())
        .map_err(|err| ChainError::ConsistencyFault(err.to_string()))?;
    ctx.update_global_state(|global| global.current_bproducer_count = count)
}

/// Creates or updates the bobserver of `owner`
pub(crate) fn bobserver_update(
    ctx: &mut EvaluationContext<'_>,
    op: &BobserverUpdateOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.owner, AuthorityLevel::Active)?;
    require_max_len("url", op.url.as_bytes(), ctx.config.max_url_length)?;
    let (min, max) = (ctx.config.min_block_size_limit, ctx.config.max_block_size_limit);
    if op.maximum_block_size < min || op.maximum_block_size > max {
        return Err(ChainError::InvalidOperation(format!(
            "proposed block size {} is outside [{}, {}]",
            op.maximum_block_size, min, max
        )));
    }

    let existing = ctx
        .db
        .find_by(BOBSERVER_BY_NAME, &BobserverObject::name_key(&op.owner))?
        .map(|bobserver| bobserver.id);
    match existing {
        Some(id) => ctx.db.modify(id, |bobserver| {
            bobserver.url = op.url.clone();
            bobserver.signing_key = op.block_signing_key.clone();
            bobserver.proposed_maximum_block_size = op.maximum_block_size;
        })?,
        None => {
            let fee_vote = ctx.global_state()?.transaction_fee;
            let now = ctx.now();
            ctx.db.create(|id| BobserverObject {
                id,
                owner: op.owner.clone(),
                url: op.url.clone(),
                signing_key: op.block_signing_key.clone(),
                proposed_maximum_block_size: op.maximum_block_size,
                transaction_fee_vote: fee_vote,
                is_bproducer: false,
                is_excepted: false,
                last_confirmed_block_num: 0,
                last_aslot: 0,
                created: now,
            })?;
        }
    }
    Ok(())
}

/// Approves or removes a bobserver from the block producer set
pub(crate) fn update_bproducer(
    ctx: &mut EvaluationContext<'_>,
    op: &UpdateBproducerOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    let bobserver = get_bobserver(ctx, &op.bobserver)?;
    let id = bobserver.id;
    if bobserver.is_bproducer == op.approve {
        return Err(ChainError::InvalidOperation(format!(
            "bobserver {} already has producer status {}",
            op.bobserver, op.approve
        )));
    }
    let producers = active_bproducers(&*ctx.db)?.len();
    if op.approve {
        if bobserver.is_excepted {
            return Err(ChainError::InvalidOperation(format!(
                "bobserver {} is excepted from production",
                op.bobserver
            )));
        }
        if producers >= ctx.config.max_bproducers as usize {
            return Err(ChainError::InvalidOperation(format!(
                "the producer set is full ({} producers)",
                producers
            )));
        }
    } else if producers <= 1 {
        return Err(ChainError::InvalidOperation(
            "the last block producer cannot be removed".to_string(),
        ));
    }

    ctx.db
        .modify(id, |bobserver| bobserver.is_bproducer = op.approve)?;
    refresh_bproducer_count(ctx)
}

/// Removes a bobserver from production for good
pub(crate) fn except_bobserver(
    ctx: &mut EvaluationContext<'_>,
    op: &ExceptBobserverOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    let bobserver = get_bobserver(ctx, &op.bobserver)?;
    let id = bobserver.id;
    if bobserver.is_excepted {
        return Err(ChainError::InvalidOperation(format!(
            "bobserver {} is already excepted",
            op.bobserver
        )));
    }
    if bobserver.is_bproducer && active_bproducers(&*ctx.db)?.len() <= 1 {
        return Err(ChainError::InvalidOperation(
            "the last block producer cannot be excepted".to_string(),
        ));
    }

    ctx.db.modify(id, |bobserver| {
        bobserver.is_excepted = true;
        bobserver.is_bproducer = false;
    })?;
    refresh_bproducer_count(ctx)
}

/// Records the fee vote of a block producer
pub(crate) fn vote_transaction_fee(
    ctx: &mut EvaluationContext<'_>,
    op: &VoteTransactionFeeOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.voter, AuthorityLevel::Active)?;
    if !ctx.get_account(&op.voter)?.can_vote {
        return Err(ChainError::Unauthorized(format!(
            "account {} declined its voting rights",
            op.voter
        )));
    }
    let bobserver = get_bobserver(ctx, &op.voter)?;
    if !bobserver.is_bproducer {
        return Err(ChainError::Unauthorized(format!(
            "{} is not a block producer",
            op.voter
        )));
    }
    let id = bobserver.id;
    let (min, max) = (ctx.config.min_transaction_fee, ctx.config.max_transaction_fee);
    if op.fee < min || op.fee > max {
        return Err(ChainError::InvalidOperation(format!(
            "fee vote {} is outside [{}, {}]",
            op.fee, min, max
        )));
    }

    ctx.db
        .modify(id, |bobserver| bobserver.transaction_fee_vote = op.fee)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{ExceptBobserverOperation, UpdateBproducerOperation};
    use sigma_models::{Amount, Operation};

    #[test]
    #[serial]
    fn producer_set_management() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.register_bobserver("alice");
        assert!(!chain.bobserver("alice").is_bproducer);

        chain.approve_bproducer("alice");
        assert!(chain.bobserver("alice").is_bproducer);
        assert_eq!(chain.global().current_bproducer_count, 2);

        let unapprove = |name: &str| {
            Operation::UpdateBproducer(UpdateBproducerOperation {
                bobserver: account(name),
                approve: false,
            })
        };
        assert_matches!(
            chain.apply(vec![unapprove("alice")], &[active("alice")]),
            Err(ChainError::Unauthorized(_))
        );

        let except = Operation::ExceptBobserver(ExceptBobserverOperation {
            bobserver: account("alice"),
        });
        chain.apply(vec![except], &[active("sigmaengine")]).unwrap();
        let alice = chain.bobserver("alice");
        assert!(alice.is_excepted && !alice.is_bproducer);
        assert_eq!(chain.global().current_bproducer_count, 1);

        assert_matches!(
            chain.apply(vec![unapprove("sigmaengine")], &[active("sigmaengine")]),
            Err(ChainError::InvalidOperation(_))
        );
    }
}
