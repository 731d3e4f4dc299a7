// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{deadline, require_max_len, require_positive, EvaluationContext};
use sigma_chain_exports::objects::{SavingsWithdrawObject, SAVINGS_BY_FROM_RID};
use sigma_chain_exports::ChainError;
use sigma_chainbase::ObjectId;
use sigma_models::operation::{
    CancelTransferSavingsOperation, ConclusionTransferSavingsOperation,
    FillTransferSavingsOperation, TransferSavingsOperation,
};
use sigma_models::{AccountName, AuthorityLevel, Operation};

fn find_request<'a>(
    ctx: &'a EvaluationContext<'_>,
    from: &AccountName,
    request_id: u32,
) -> Result<Option<&'a SavingsWithdrawObject>, ChainError> {
    Ok(ctx.db.find_by(
        SAVINGS_BY_FROM_RID,
        &SavingsWithdrawObject::request_key(from, request_id),
    )?)
}

fn get_request<'a>(
    ctx: &'a EvaluationContext<'_>,
    from: &AccountName,
    request_id: u32,
) -> Result<&'a SavingsWithdrawObject, ChainError> {
    find_request(ctx, from, request_id)?.ok_or_else(|| {
        ChainError::NotFound(format!("savings request {} of {}", request_id, from))
    })
}

/// Removes a request and releases its slot in the sender's request count
fn close_request(
    ctx: &mut EvaluationContext<'_>,
    id: ObjectId<SavingsWithdrawObject>,
    from: &AccountName,
) -> Result<(), ChainError> {
    ctx.db.remove(id)?;
    ctx.modify_account(from, |account| {
        account.savings_withdraw_requests = account.savings_withdraw_requests.saturating_sub(1)
    })
}

/// Escrows `amount` until the savings delay has passed
pub(crate) fn transfer_savings(
    ctx: &mut EvaluationContext<'_>,
    op: &TransferSavingsOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    require_positive(op.amount)?;
    require_max_len("memo", op.memo.as_bytes(), ctx.config.max_memo_size)?;
    ctx.require_receiver(&op.to)?;
    let pending = ctx.get_account(&op.from)?.savings_withdraw_requests;
    if pending >= ctx.config.savings_withdraw_request_limit {
        return Err(ChainError::InvalidOperation(format!(
            "{} already has {} pending savings requests",
            op.from, pending
        )));
    }
    if find_request(ctx, &op.from, op.request_id)?.is_some() {
        return Err(ChainError::ConstraintViolation(format!(
            "savings request {} of {} already exists",
            op.request_id, op.from
        )));
    }

    ctx.debit(&op.from, op.amount)?;
    let now = ctx.now();
    let complete = deadline(now, ctx.config.savings_withdraw_time)?;
    ctx.db.create(|id| SavingsWithdrawObject {
        id,
        from: op.from.clone(),
        to: op.to.clone(),
        request_id: op.request_id,
        amount: op.amount,
        memo: op.memo.clone(),
        request_time: now,
        complete,
    })?;
    ctx.modify_account(&op.from, |account| account.savings_withdraw_requests += 1)
}

/// Returns the escrowed funds to the sender
pub(crate) fn cancel_transfer_savings(
    ctx: &mut EvaluationContext<'_>,
    op: &CancelTransferSavingsOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.from, AuthorityLevel::Active)?;
    let request = get_request(ctx, &op.from, op.request_id)?;
    let (id, amount) = (request.id, request.amount);

    ctx.credit(&op.from, amount)?;
    close_request(ctx, id, &op.from)
}

/// Pays a matured request to its recipient
pub(crate) fn conclusion_transfer_savings(
    ctx: &mut EvaluationContext<'_>,
    op: &ConclusionTransferSavingsOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.to, AuthorityLevel::Active)?;
    let request = get_request(ctx, &op.from, op.request_id)?;
    if request.to != op.to {
        return Err(ChainError::Unauthorized(format!(
            "savings request {} of {} is not addressed to {}",
            op.request_id, op.from, op.to
        )));
    }
    if ctx.now() < request.complete {
        return Err(ChainError::NotMatured(format!(
            "savings request {} of {} completes at {}",
            op.request_id, op.from, request.complete
        )));
    }
    let request = request.clone();

    ctx.credit(&op.to, request.amount)?;
    close_request(ctx, request.id, &op.from)?;
    ctx.emit_virtual(Operation::FillTransferSavings(FillTransferSavingsOperation {
        from: request.from,
        to: request.to,
        request_id: request.request_id,
        amount: request.amount,
        memo: request.memo,
    }))
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{
        CancelTransferSavingsOperation, ConclusionTransferSavingsOperation,
        TransferSavingsOperation,
    };
    use sigma_models::{Amount, Operation};

    fn savings(request_id: u32) -> Operation {
        Operation::TransferSavings(TransferSavingsOperation {
            from: account("alice"),
            to: account("bob"),
            request_id,
            amount: Amount::from_mantissa_scale(10, 0),
            memo: String::new(),
        })
    }

    fn conclusion(request_id: u32) -> Operation {
        Operation::ConclusionTransferSavings(ConclusionTransferSavingsOperation {
            from: account("alice"),
            to: account("bob"),
            request_id,
        })
    }

    #[test]
    #[serial]
    fn savings_lifecycle() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(1, 0));
        chain.apply(vec![savings(1)], &[active("alice")]).unwrap();
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(90, 0));
        assert_eq!(chain.account("alice").savings_withdraw_requests, 1);
        assert_matches!(
            chain.apply(vec![savings(1)], &[active("alice")]),
            Err(ChainError::ConstraintViolation(_))
        );

        assert_matches!(
            chain.apply(vec![conclusion(1)], &[active("bob")]),
            Err(ChainError::NotMatured(_))
        );
        // 9 second delay with 3 second blocks
        chain.skip_blocks(2);
        let block = chain.apply(vec![conclusion(1)], &[active("bob")]).unwrap();
        assert_eq!(chain.account("bob").balance, Amount::from_mantissa_scale(11, 0));
        assert_eq!(chain.account("alice").savings_withdraw_requests, 0);

        let fills = chain.virtual_operations(block);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].op.name(), "fill_transfer_savings");
        assert_eq!(fills[0].virtual_op, 1);
    }

    #[test]
    #[serial]
    fn savings_cancel_and_limit() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(100, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(1, 0));
        chain
            .apply(vec![savings(1), savings(2)], &[active("alice")])
            .unwrap();
        assert_matches!(
            chain.apply(vec![savings(3)], &[active("alice")]),
            Err(ChainError::InvalidOperation(_))
        );

        let cancel = Operation::CancelTransferSavings(CancelTransferSavingsOperation {
            from: account("alice"),
            request_id: 2,
        });
        chain.apply(vec![cancel], &[active("alice")]).unwrap();
        assert_eq!(chain.account("alice").balance, Amount::from_mantissa_scale(90, 0));
        chain.apply(vec![savings(3)], &[active("alice")]).unwrap();
        assert_eq!(chain.account("alice").savings_withdraw_requests, 2);
    }
}
