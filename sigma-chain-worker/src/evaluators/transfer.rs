// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{require_max_len, require_positive, EvaluationContext};
use sigma_chain_exports::ChainError;
use sigma_models::operation::TransferOperation;
use sigma_models::AuthorityLevel;

/// Moves `amount` and charges the current transaction fee to the sender.
/// Fees go to the mining reward pool.
pub(crate) fn transfer(
    ctx: &mut EvaluationContext<'_>,
    op: &TransferOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    require_positive(op.amount)?;
    require_max_len("memo", op.memo.as_bytes(), ctx.config.max_memo_size)?;
    ctx.require_receiver(&op.to)?;
    let global = ctx.global_state()?;
    let fee = global.transaction_fee;
    let pool = global.mining_reward_account.clone();
    let total = op.amount.checked_add(fee).ok_or_else(|| {
        ChainError::InvalidOperation(format!("transfer of {} overflows with its fee", op.amount))
    })?;
    if ctx.get_account(&op.from)?.balance < total {
        return Err(ChainError::InvalidOperation(format!(
            "insufficient balance on account {} to transfer {} with a fee of {}",
            op.from, op.amount, fee
        )));
    }

    ctx.move_funds(&op.from, &op.to, op.amount)?;
    if !fee.is_zero() {
        ctx.move_funds(&op.from, &pool, fee)?;
    }
    ctx.update_global_state(|global| {
        global.total_transfer = global.total_transfer.saturating_add(1)
    })
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::TransferOperation;
    use sigma_models::{Amount, Operation};

    fn transfer(from: &str, to: &str, amount: Amount) -> Operation {
        Operation::Transfer(TransferOperation {
            from: account(from),
            to: account(to),
            amount,
            memo: "thanks".to_string(),
        })
    }

    #[test]
    #[serial]
    fn transfer_pays_the_fee_to_the_mining_pool() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(1, 0));
        let fee = chain.global().transaction_fee;
        let pool_before = chain.account("sgt.reward").balance;

        chain
            .apply(
                vec![transfer("alice", "bob", Amount::from_mantissa_scale(30, 0))],
                &[active("alice")],
            )
            .unwrap();

        let alice = Amount::from_mantissa_scale(70, 0).checked_sub(fee).unwrap();
        assert_eq!(chain.account("alice").balance, alice);
        assert_eq!(chain.account("bob").balance, Amount::from_mantissa_scale(31, 0));
        assert_eq!(
            chain.account("sgt.reward").balance,
            pool_before.checked_add(fee).unwrap()
        );
        assert_eq!(chain.global().total_transfer, 1);
    }

    #[test]
    #[serial]
    fn transfer_checks() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        assert_matches!(
            chain.apply(
                vec![transfer("alice", "bob", Amount::from_mantissa_scale(30, 0))],
                &[active("alice")]
            ),
            Err(ChainError::InvalidOperation(_))
        );
        assert_matches!(
            chain.apply(
                vec![transfer("alice", "sigmaengine", Amount::from_mantissa_scale(100, 0))],
                &[active("alice")]
            ),
            Err(ChainError::InvalidOperation(_))
        );
        assert_matches!(
            chain.apply(
                vec![transfer("alice", "sigmaengine", Amount::zero())],
                &[active("alice")]
            ),
            Err(ChainError::InvalidOperation(_))
        );
        assert_matches!(
            chain.apply(
                vec![transfer("alice", "sigmaengine", Amount::from_mantissa_scale(1, 0))],
                &[active("sigmaengine")]
            ),
            Err(ChainError::Unauthorized(_))
        );
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(100, 0));
    }
}
