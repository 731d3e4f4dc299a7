// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Staking funds: principal is locked for a number of staking months and
//! earns interest reserved from the fund pool when the stake is opened.

use crate::context::{deadline, require_max_len, require_positive, EvaluationContext};
use sigma_chain_exports::objects::{
    FundObject, FundWithdrawObject, FUND_BY_NAME, FUND_WITHDRAW_BY_FROM_FUND_RID,
};
use sigma_chain_exports::ChainError;
use sigma_chainbase::ObjectId;
use sigma_models::config::constants::PERCENT_100;
use sigma_models::operation::{
    ConclusionStakingOperation, FillStakingFundOperation, ReturnStakingFundOperation,
    SetFundInterestOperation, StakingFundOperation, TransferFundOperation,
};
use sigma_models::{AccountName, AuthorityLevel, Operation};

fn get_fund<'a>(ctx: &'a EvaluationContext<'_>, name: &str) -> Result<&'a FundObject, ChainError> {
    ctx.db
        .find_by(FUND_BY_NAME, &FundObject::name_key(name))?
        .ok_or_else(|| ChainError::NotFound(format!("fund {}", name)))
}

fn find_stake<'a>(
    ctx: &'a EvaluationContext<'_>,
    from: &AccountName,
    fund_name: &str,
    request_id: u32,
) -> Result<Option<&'a FundWithdrawObject>, ChainError> {
    Ok(ctx.db.find_by(
        FUND_WITHDRAW_BY_FROM_FUND_RID,
        &FundWithdrawObject::request_key(from, fund_name, request_id),
    )?)
}

fn get_stake<'a>(
    ctx: &'a EvaluationContext<'_>,
    from: &AccountName,
    fund_name: &str,
    request_id: u32,
) -> Result<&'a FundWithdrawObject, ChainError> {
    find_stake(ctx, from, fund_name, request_id)?.ok_or_else(|| {
        ChainError::NotFound(format!(
            "stake {} of {} in fund {}",
            request_id, from, fund_name
        ))
    })
}

fn check_month(ctx: &EvaluationContext<'_>, month: u8) -> Result<(), ChainError> {
    if month == 0 || month > ctx.config.max_staking_months {
        return Err(ChainError::InvalidOperation(format!(
            "staking period of {} months is outside [1, {}]",
            month, ctx.config.max_staking_months
        )));
    }
    Ok(())
}

/// Closes a stake: principal back to the staker, the reserved interest either
/// paid along (`pay_interest`) or returned to the pool
fn close_stake(
    ctx: &mut EvaluationContext<'_>,
    id: ObjectId<FundWithdrawObject>,
    pay_interest: bool,
) -> Result<FundWithdrawObject, ChainError> {
    let stake = ctx.db.get(id)?.clone();
    let fund = get_fund(ctx, &stake.fund_name)?;
    let fund_id = fund.id;
    let withdraw_balance = fund
        .withdraw_balance
        .checked_sub(stake.interest)
        .ok_or_else(|| {
            ChainError::ConsistencyFault(format!(
                "fund {} reserved less than the interest of a stake",
                fund.name
            ))
        })?;
    let (balance, payout) = if pay_interest {
        (fund.balance, stake.amount.checked_add(stake.interest))
    } else {
        (fund.balance.saturating_add(stake.interest), Some(stake.amount))
    };
    let payout = payout
        .ok_or_else(|| ChainError::InvalidOperation("stake payout overflows".to_string()))?;

    ctx.db.modify(fund_id, |fund| {
        fund.balance = balance;
        fund.withdraw_balance = withdraw_balance;
    })?;
    ctx.credit(&stake.from, payout)?;
    ctx.db.remove(id)?;
    ctx.modify_account(&stake.from, |account| {
        account.staking_requests = account.staking_requests.saturating_sub(1)
    })?;
    Ok(stake)
}

pub(crate) fn staking_fund(
    ctx: &mut EvaluationContext<'_>,
    op: &StakingFundOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    require_positive(op.amount)?;
    require_max_len("memo", op.memo.as_bytes(), ctx.config.max_memo_size)?;
    check_month(ctx, op.month)?;
    let fund = get_fund(ctx, &op.fund_name)?;
    let fund_id = fund.id;
    let interest = op
        .amount
        .checked_basis_points(u32::from(fund.interest_rate(op.month)))
        .ok_or_else(|| ChainError::InvalidOperation("interest overflows".to_string()))?;
    if fund.balance < interest {
        return Err(ChainError::InvalidOperation(format!(
            "fund {} cannot reserve an interest of {}",
            op.fund_name, interest
        )));
    }
    let pending = ctx.get_account(&op.from)?.staking_requests;
    if pending >= ctx.config.staking_request_limit {
        return Err(ChainError::InvalidOperation(format!(
            "{} already has {} open stakes",
            op.from, pending
        )));
    }
    if find_stake(ctx, &op.from, &op.fund_name, op.request_id)?.is_some() {
        return Err(ChainError::ConstraintViolation(format!(
            "stake {} of {} in fund {} already exists",
            op.request_id, op.from, op.fund_name
        )));
    }
    let now = ctx.now();
    let period = ctx
        .config
        .staking_month
        .checked_mul(u64::from(op.month))
        .map_err(|err| ChainError::ConsistencyFault(err.to_string()))?;
    let complete = deadline(now, period)?;

    ctx.debit(&op.from, op.amount)?;
    ctx.db.modify(fund_id, |fund| {
        fund.balance = fund.balance.saturating_sub(interest);
        fund.withdraw_balance = fund.withdraw_balance.saturating_add(interest);
    })?;
    ctx.db.create(|id| FundWithdrawObject {
        id,
        from: op.from.clone(),
        fund_name: op.fund_name.clone(),
        request_id: op.request_id,
        amount: op.amount,
        interest,
        request_time: now,
        complete,
    })?;
    ctx.modify_account(&op.from, |account| account.staking_requests += 1)
}

/// Pays principal and interest of a matured stake
pub(crate) fn conclusion_staking(
    ctx: &mut EvaluationContext<'_>,
    op: &ConclusionStakingOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    let stake = get_stake(ctx, &op.from, &op.fund_name, op.request_id)?;
    if ctx.now() < stake.complete {
        return Err(ChainError::NotMatured(format!(
            "stake {} of {} unlocks at {}",
            op.request_id, op.from, stake.complete
        )));
    }
    let id = stake.id;

    let stake = close_stake(ctx, id, true)?;
    ctx.emit_virtual(Operation::FillStakingFund(FillStakingFundOperation {
        from: stake.from,
        fund_name: stake.fund_name,
        request_id: stake.request_id,
        amount: stake.amount,
        interest: stake.interest,
    }))
}

/// Donation to the pool of a fund
pub(crate) fn transfer_fund(
    ctx: &mut EvaluationContext<'_>,
    op: &TransferFundOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    require_positive(op.amount)?;
    require_max_len("memo", op.memo.as_bytes(), ctx.config.max_memo_size)?;
    let fund = get_fund(ctx, &op.fund_name)?;
    let fund_id = fund.id;
    let balance = fund.balance.checked_add(op.amount).ok_or_else(|| {
        ChainError::InvalidOperation(format!("fund {} balance overflows", op.fund_name))
    })?;

    ctx.debit(&op.from, op.amount)?;
    ctx.db.modify(fund_id, |fund| fund.balance = balance)?;
    Ok(())
}

/// Interest in basis points for stakes of `month` months. Zero removes the rate.
pub(crate) fn set_fund_interest(
    ctx: &mut EvaluationContext<'_>,
    op: &SetFundInterestOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    check_month(ctx, op.month)?;
    if u32::from(op.percent_interest) > PERCENT_100 {
        return Err(ChainError::InvalidOperation(format!(
            "interest of {} basis points exceeds {}",
            op.percent_interest, PERCENT_100
        )));
    }
    let fund_id = get_fund(ctx, &op.fund_name)?.id;

    ctx.db.modify(fund_id, |fund| {
        if op.percent_interest == 0 {
            fund.interest_rates.remove(&op.month);
        } else {
            fund.interest_rates.insert(op.month, op.percent_interest);
        }
    })?;
    Ok(())
}

/// Early return decided by root: the principal goes back to the staker and the
/// reserved interest back to the pool
pub(crate) fn return_staking_fund(
    ctx: &mut EvaluationContext<'_>,
    op: &ReturnStakingFundOperation,
) -> Result<(), ChainError> {
    ctx.require_root()?;
    let id = get_stake(ctx, &op.from, &op.fund_name, op.request_id)?.id;
    close_stake(ctx, id, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{
        ConclusionStakingOperation, ReturnStakingFundOperation, SetFundInterestOperation,
        StakingFundOperation, TransferFundOperation,
    };
    use sigma_models::{Amount, Operation};

    fn prepare() -> TestChain {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        let donation = Operation::TransferFund(TransferFundOperation {
            from: account("sigmaengine"),
            fund_name: "staking".to_string(),
            amount: Amount::from_mantissa_scale(1_000, 0),
            memo: String::new(),
        });
        let rate = Operation::SetFundInterest(SetFundInterestOperation {
            fund_name: "staking".to_string(),
            month: 2,
            percent_interest: 500,
        });
        chain
            .apply(vec![donation, rate], &[active("sigmaengine")])
            .unwrap();
        chain
    }

    fn stake(request_id: u32) -> Operation {
        Operation::StakingFund(StakingFundOperation {
            from: account("alice"),
            fund_name: "staking".to_string(),
            request_id,
            amount: Amount::from_mantissa_scale(40, 0),
            memo: String::new(),
            month: 2,
        })
    }

    #[test]
    #[serial]
    fn stake_matures_with_interest() {
        let mut chain = prepare();
        chain.apply(vec![stake(1)], &[active("alice")]).unwrap();
        // 5% of 40
        let interest = Amount::from_mantissa_scale(2, 0);
        let fund = chain.fund("staking");
        assert_eq!(fund.withdraw_balance, interest);
        assert_eq!(fund.balance, Amount::from_mantissa_scale(998, 0));

        let conclude = Operation::ConclusionStaking(ConclusionStakingOperation {
            from: account("alice"),
            fund_name: "staking".to_string(),
            request_id: 1,
        });
        assert_matches!(
            chain.apply(vec![conclude.clone()], &[active("alice")]),
            Err(ChainError::NotMatured(_))
        );
        // two 6 second months with 3 second blocks
        chain.skip_blocks(3);
        let block = chain.apply(vec![conclude], &[active("alice")]).unwrap();
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(102, 0));
        assert_eq!(chain.fund("staking").withdraw_balance, Amount::zero());
        let fills = chain.virtual_operations(block);
        assert_eq!(fills[0].op.name(), "fill_staking_fund");
    }

    #[test]
    #[serial]
    fn stake_checks_and_early_return() {
        let mut chain = prepare();
        let mut long = stake(1);
        if let Operation::StakingFund(op) = &mut long {
            op.month = 4;
        }
        assert_matches!(
            chain.apply(vec![long], &[active("alice")]),
            Err(ChainError::InvalidOperation(_))
        );
        chain.apply(vec![stake(1)], &[active("alice")]).unwrap();

        let early = Operation::ReturnStakingFund(ReturnStakingFundOperation {
            from: account("alice"),
            fund_name: "staking".to_string(),
            request_id: 1,
        });
        assert_matches!(
            chain.apply(vec![early.clone()], &[active("alice")]),
            Err(ChainError::Unauthorized(_))
        );
        chain.apply(vec![early], &[active("sigmaengine")]).unwrap();
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(100, 0));
        let fund = chain.fund("staking");
        assert_eq!(fund.balance, Amount::from_mantissa_scale(1_000, 0));
        assert_eq!(fund.withdraw_balance, Amount::zero());
        assert_eq!(chain.account("alice").staking_requests, 0);
    }
}
