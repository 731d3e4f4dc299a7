// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{require_max_len, require_positive, EvaluationContext};
use sigma_chain_exports::ChainError;
use sigma_models::operation::{SetBlacklistAccountOperation, SetSwapAccountOperation, SwapOperation};
use sigma_models::AuthorityLevel;

/// Blacklisted accounts can neither sign nor receive
pub(crate) fn set_blacklist_account(
    ctx: &mut EvaluationContext<'_>,
    op: &SetBlacklistAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    if op.account == ctx.config.root_account {
        return Err(ChainError::InvalidOperation(
            "the root account cannot be blacklisted".to_string(),
        ));
    }
    if ctx.get_account(&op.account)?.is_blacklisted == op.blacklisted {
        return Err(ChainError::InvalidOperation(format!(
            "blacklist status of {} is already {}",
            op.account, op.blacklisted
        )));
    }
    ctx.modify_account(&op.account, |account| account.is_blacklisted = op.blacklisted)
}

pub(crate) fn set_swap_account(
    ctx: &mut EvaluationContext<'_>,
    op: &SetSwapAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    ctx.get_account(&op.account)?;
    let account = op.account.clone();
    ctx.update_global_state(|global| global.swap_account = account)
}

/// Hands funds to the swap account, to be released on the `target` chain
pub(crate) fn swap(ctx: &mut EvaluationContext<'_>, op: &SwapOperation) -> Result<(), ChainError> {
    ctx.require_authority(&op.account, AuthorityLevel::Active)?;
    require_positive(op.amount)?;
    if op.target.is_empty() {
        return Err(ChainError::InvalidOperation(
            "swap target cannot be empty".to_string(),
        ));
    }
    require_max_len(
        "swap target",
        op.target.as_bytes(),
        ctx.config.max_swap_target_length,
    )?;
    let swap_account = ctx.global_state()?.swap_account.clone();
    if swap_account == op.account {
        return Err(ChainError::InvalidOperation(
            "the swap account cannot swap to itself".to_string(),
        ));
    }
    ctx.move_funds(&op.account, &swap_account, op.amount)
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{
        SetBlacklistAccountOperation, SetSwapAccountOperation, SwapOperation, TransferOperation,
    };
    use sigma_models::{Amount, Operation};

    fn blacklist(name: &str, blacklisted: bool) -> Operation {
        Operation::SetBlacklistAccount(SetBlacklistAccountOperation {
            account: account(name),
            blacklisted,
        })
    }

    #[test]
    #[serial]
    fn blacklisted_accounts_cannot_sign_or_receive() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(10, 0));
        chain
            .apply(vec![blacklist("bob", true)], &[active("sigmaengine")])
            .unwrap();
        let transfer = |from: &str, to: &str| {
            Operation::Transfer(TransferOperation {
                from: account(from),
                to: account(to),
                amount: Amount::from_mantissa_scale(1, 0),
                memo: String::new(),
            })
        };
        assert_matches!(
            chain.apply(vec![transfer("alice", "bob")], &[active("alice")]),
            Err(ChainError::InvalidOperation(_))
        );
        assert_matches!(
            chain.apply(vec![transfer("bob", "alice")], &[active("bob")]),
            Err(ChainError::Unauthorized(_))
        );
        assert_matches!(
            chain.apply(vec![blacklist("sigmaengine", true)], &[active("sigmaengine")]),
            Err(ChainError::InvalidOperation(_))
        );
        chain
            .apply(vec![blacklist("bob", false)], &[active("sigmaengine")])
            .unwrap();
        chain
            .apply(vec![transfer("alice", "bob")], &[active("alice")])
            .unwrap();
    }

    #[test]
    #[serial]
    fn swap_moves_funds_to_the_swap_account() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.create_account("bridge", Amount::from_mantissa_scale(1, 0));
        let set_swap = Operation::SetSwapAccount(SetSwapAccountOperation {
            account: account("bridge"),
        });
        chain.apply(vec![set_swap], &[active("sigmaengine")]).unwrap();
        assert_eq!(chain.global().swap_account, account("bridge"));

        let swap = Operation::Swap(SwapOperation {
            account: account("alice"),
            amount: Amount::from_mantissa_scale(4, 0),
            target: "0x5a0b54d5dc17e0aadc383d2db43b0a0d3e029c4c".to_string(),
        });
        chain.apply(vec![swap], &[active("alice")]).unwrap();
        assert_eq!(chain.account("bridge").balance, Amount::from_mantissa_scale(5, 0));
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(6, 0));
    }
}
