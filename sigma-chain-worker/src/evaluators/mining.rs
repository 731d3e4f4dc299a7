// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{elapsed, require_max_len, require_positive, EvaluationContext};
use sigma_chain_exports::ChainError;
use sigma_models::operation::{
    FillMiningRewardOperation, FillProducerMiningRewardOperation, MiningOperation,
    SetMiningAccountOperation, TransferMiningRewardOperation,
};
use sigma_models::{AuthorityLevel, Operation};

/// Pays the mining reward out of the pool, split between the miner and the
/// producer of the block. Each share is logged as a virtual operation.
pub(crate) fn mining(ctx: &mut EvaluationContext<'_>, op: &MiningOperation) -> Result<(), ChainError> {
    ctx.require_authority(&op.account, AuthorityLevel::Active)?;
    let now = ctx.now();
    let last_mining_time = ctx.get_account(&op.account)?.last_mining_time;
    if last_mining_time.to_millis() != 0
        && elapsed(now, last_mining_time) < ctx.config.mining_interval
    {
        return Err(ChainError::TooEarly(format!(
            "{} mined less than {} ago",
            op.account, ctx.config.mining_interval
        )));
    }
    let pool = ctx.global_state()?.mining_reward_account.clone();
    let reward = ctx.config.mining_reward;
    let pool_balance = ctx.get_account(&pool)?.balance;
    if pool_balance < reward {
        return Err(ChainError::InvalidOperation(format!(
            "mining reward pool holds {}, less than the reward of {}",
            pool_balance, reward
        )));
    }
    let producer_reward = reward
        .checked_basis_points(ctx.config.mining_producer_share)
        .ok_or_else(|| ChainError::InvalidOperation("producer share overflows".to_string()))?;
    let miner_reward = reward.saturating_sub(producer_reward);
    let producer = ctx.producer.clone();
    ctx.get_account(&producer)?;

    ctx.move_funds(&pool, &op.account, miner_reward)?;
    ctx.move_funds(&pool, &producer, producer_reward)?;
    ctx.modify_account(&op.account, |account| account.last_mining_time = now)?;
    ctx.emit_virtual(Operation::FillMiningReward(FillMiningRewardOperation {
        account: op.account.clone(),
        reward: miner_reward,
    }))?;
    ctx.emit_virtual(Operation::FillProducerMiningReward(
        FillProducerMiningRewardOperation {
            producer,
            reward: producer_reward,
        },
    ))
}

/// Moves the mining reward pool to another account. The balance of the
/// previous pool account stays where it is.
pub(crate) fn set_mining_account(
    ctx: &mut EvaluationContext<'_>,
    op: &SetMiningAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    ctx.get_account(&op.account)?;
    let account = op.account.clone();
    ctx.update_global_state(|global| global.mining_reward_account = account)
}

pub(crate) fn transfer_mining_reward(
    ctx: &mut EvaluationContext<'_>,
    op: &TransferMiningRewardOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    require_positive(op.amount)?;
    require_max_len("memo", op.memo.as_bytes(), ctx.config.max_memo_size)?;
    ctx.require_receiver(&op.to)?;
    let pool = ctx.global_state()?.mining_reward_account.clone();
    ctx.move_funds(&pool, &op.to, op.amount)
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use more_asserts::assert_gt;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{MiningOperation, TransferMiningRewardOperation};
    use sigma_models::{Amount, Operation};

    fn mining(name: &str) -> Operation {
        Operation::Mining(MiningOperation {
            account: account(name),
        })
    }

    /// Funds the pool through root, which can print
    fn fund_pool(chain: &mut TestChain, amount: Amount) {
        chain.print("sgt.reward", amount);
    }

    #[test]
    #[serial]
    fn mining_emits_two_ordered_virtual_operations() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(1, 0));
        fund_pool(&mut chain, Amount::from_mantissa_scale(100, 0));
        let root_before = chain.account("sigmaengine").balance;

        let block = chain.apply(vec![mining("alice")], &[active("alice")]).unwrap();

        // 10% producer share of a 10 coin reward
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(10, 0));
        assert_eq!(
            chain.account("sigmaengine").balance,
            root_before.checked_add(Amount::from_mantissa_scale(1, 0)).unwrap()
        );
        let ops = chain.applied_operations(block);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].op.name(), "mining");
        assert_eq!(ops[0].virtual_op, 0);
        assert_eq!(ops[1].op.name(), "fill_mining_reward");
        assert_eq!(ops[2].op.name(), "fill_producer_mining_reward");
        assert_gt!(ops[1].virtual_op, 0);
        assert_gt!(ops[2].virtual_op, ops[1].virtual_op);
        assert_gt!(ops[2].op_id, ops[1].op_id);
        for op in &ops {
            assert_eq!(op.block, block);
            assert_eq!(op.trx_in_block, 0);
            assert_eq!(op.op_in_trx, 0);
            assert_eq!(op.trx_id, ops[0].trx_id);
        }
    }

    #[test]
    #[serial]
    fn mining_cooldown_and_empty_pool() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(1, 0));
        assert_matches!(
            chain.apply(vec![mining("alice")], &[active("alice")]),
            Err(ChainError::InvalidOperation(_))
        );
        fund_pool(&mut chain, Amount::from_mantissa_scale(100, 0));
        chain.apply(vec![mining("alice")], &[active("alice")]).unwrap();
        assert_matches!(
            chain.apply(vec![mining("alice")], &[active("alice")]),
            Err(ChainError::TooEarly(_))
        );
        // 6 second interval with 3 second blocks
        chain.skip_blocks(1);
        chain.apply(vec![mining("alice")], &[active("alice")]).unwrap();
    }

    #[test]
    #[serial]
    fn root_pays_out_of_the_pool() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(1, 0));
        fund_pool(&mut chain, Amount::from_mantissa_scale(5, 0));
        let payout = Operation::TransferMiningReward(TransferMiningRewardOperation {
            to: account("alice"),
            amount: Amount::from_mantissa_scale(5, 0),
            memo: String::new(),
        });
        assert_matches!(
            chain.apply(vec![payout.clone()], &[active("alice")]),
            Err(ChainError::Unauthorized(_))
        );
        chain.apply(vec![payout], &[active("sigmaengine")]).unwrap();
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(6, 0));
        assert_eq!(chain.account("sgt.reward").balance, Amount::zero());
    }
}
