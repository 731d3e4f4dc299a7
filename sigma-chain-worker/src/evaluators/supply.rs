// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{require_positive, EvaluationContext};
use sigma_chain_exports::ChainError;
use sigma_models::operation::{BurnOperation, PrintOperation, RootBurnOperation};
use sigma_models::{AccountName, Amount, AuthorityLevel};

/// Mints `amount` into an account
pub(crate) fn print(ctx: &mut EvaluationContext<'_>, op: &PrintOperation) -> Result<(), ChainError> {
    ctx.require_root()?;
    require_positive(op.amount)?;
    let supply = ctx
        .global_state()?
        .current_supply
        .checked_add(op.amount)
        .ok_or_else(|| ChainError::InvalidOperation("current supply overflows".to_string()))?;

    ctx.credit(&op.account, op.amount)?;
    ctx.update_global_state(|global| global.current_supply = supply)
}

pub(crate) fn burn(ctx: &mut EvaluationContext<'_>, op: &BurnOperation) -> Result<(), ChainError> {
    ctx.require_authority(&op.account, AuthorityLevel::Active)?;
    destroy(ctx, &op.account, op.amount)
}

pub(crate) fn root_burn(
    ctx: &mut EvaluationContext<'_>,
    op: &RootBurnOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    ctx.get_account(&op.account)?;
    destroy(ctx, &op.account, op.amount)
}

/// Burned coins leave `current_supply` for good and are counted in
/// `burned_supply`
fn destroy(
    ctx: &mut EvaluationContext<'_>,
    account: &AccountName,
    amount: Amount,
) -> Result<(), ChainError> {
    require_positive(amount)?;
    let global = ctx.global_state()?;
    let supply = global.current_supply.checked_sub(amount).ok_or_else(|| {
        ChainError::ConsistencyFault(format!(
            "burning {} exceeds the current supply of {}",
            amount, global.current_supply
        ))
    })?;
    let burned = global
        .burned_supply
        .checked_add(amount)
        .ok_or_else(|| ChainError::ConsistencyFault("burned supply overflows".to_string()))?;

    ctx.debit(account, amount)?;
    ctx.update_global_state(|global| {
        global.current_supply = supply;
        global.burned_supply = burned;
    })
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{BurnOperation, RootBurnOperation};
    use sigma_models::{Amount, Operation};

    #[test]
    #[serial]
    fn supply_accounting() {
        let mut chain = TestChain::new();
        let initial = chain.global().current_supply;
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.print("alice", Amount::from_mantissa_scale(5, 0));
        let printed = initial.checked_add(Amount::from_mantissa_scale(5, 0)).unwrap();
        assert_eq!(chain.global().current_supply, printed);

        let burn = Operation::Burn(BurnOperation {
            account: account("alice"),
            amount: Amount::from_mantissa_scale(3, 0),
        });
        chain.apply(vec![burn], &[active("alice")]).unwrap();
        let root_burn = Operation::RootBurn(RootBurnOperation {
            account: account("alice"),
            amount: Amount::from_mantissa_scale(2, 0),
        });
        assert_matches!(
            chain.apply(vec![root_burn.clone()], &[active("alice")]),
            Err(ChainError::Unauthorized(_))
        );
        chain.apply(vec![root_burn], &[active("sigmaengine")]).unwrap();

        let global = chain.global();
        assert_eq!(global.burned_supply, Amount::from_mantissa_scale(5, 0));
        assert_eq!(global.current_supply, initial);
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(10, 0));

        let overdraw = Operation::Burn(BurnOperation {
            account: account("alice"),
            amount: Amount::from_mantissa_scale(11, 0),
        });
        assert_matches!(
            chain.apply(vec![overdraw], &[active("alice")]),
            Err(ChainError::InvalidOperation(_))
        );
    }
}
