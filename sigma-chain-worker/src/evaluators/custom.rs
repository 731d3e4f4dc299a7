// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{require_max_len, EvaluationContext};
use sigma_chain_exports::ChainError;
use sigma_models::operation::{
    CustomBinaryOperation, CustomJsonDappOperation, CustomJsonOperation, CustomOperation,
};
use sigma_models::{AccountName, AuthorityLevel};
use std::collections::BTreeSet;

/// Every listed account must approve at its level, and at least one
/// account must be listed
fn require_auths(
    ctx: &EvaluationContext<'_>,
    auths: &[(&BTreeSet<AccountName>, AuthorityLevel)],
) -> Result<(), ChainError> {
    if auths.iter().all(|(accounts, _)| accounts.is_empty()) {
        return Err(ChainError::InvalidOperation(
            "custom operations need at least one required authority".to_string(),
        ));
    }
    for (accounts, level) in auths {
        for account in accounts.iter() {
            ctx.require_authority(account, *level)?;
        }
    }
    Ok(())
}

fn require_json(ctx: &EvaluationContext<'_>, id: &str, json: &str) -> Result<(), ChainError> {
    require_max_len("custom id", id.as_bytes(), ctx.config.max_custom_id_length)?;
    require_max_len("custom json", json.as_bytes(), ctx.config.max_custom_data_size)?;
    serde_json::from_str::<serde_json::Value>(json)
        .map_err(|err| ChainError::InvalidOperation(format!("custom json is not valid: {}", err)))?;
    Ok(())
}

/// Opaque data for off-chain consumers, no state change
pub(crate) fn custom(ctx: &mut EvaluationContext<'_>, op: &CustomOperation) -> Result<(), ChainError> {
    require_auths(ctx, &[(&op.required_auths, AuthorityLevel::Active)])?;
    require_max_len("custom data", &op.data, ctx.config.max_custom_data_size)
}

pub(crate) fn custom_json(
    ctx: &mut EvaluationContext<'_>,
    op: &CustomJsonOperation,
) -> Result<(), ChainError> {
    require_auths(
        ctx,
        &[
            (&op.required_auths, AuthorityLevel::Active),
            (&op.required_posting_auths, AuthorityLevel::Posting),
        ],
    )?;
    require_json(ctx, &op.id, &op.json)
}

/// Like `custom_json`, charging the dapp fee to the first account of the
/// strongest non-empty authority set
pub(crate) fn custom_json_dapp(
    ctx: &mut EvaluationContext<'_>,
    op: &CustomJsonDappOperation,
) -> Result<(), ChainError> {
    require_auths(
        ctx,
        &[
            (&op.required_owner_auths, AuthorityLevel::Owner),
            (&op.required_active_auths, AuthorityLevel::Active),
            (&op.required_posting_auths, AuthorityLevel::Posting),
        ],
    )?;
    require_json(ctx, &op.id, &op.json)?;

    let payer = op
        .required_owner_auths
        .iter()
        .chain(op.required_active_auths.iter())
        .chain(op.required_posting_auths.iter())
        .next()
        .cloned()
        .ok_or_else(|| ChainError::InvalidOperation("dapp operation without payer".to_string()))?;
    let global = ctx.global_state()?;
    let fee = global.dapp_transaction_fee;
    let pool = global.mining_reward_account.clone();
    if !fee.is_zero() {
        ctx.move_funds(&payer, &pool, fee)?;
    }
    Ok(())
}

pub(crate) fn custom_binary(
    ctx: &mut EvaluationContext<'_>,
    op: &CustomBinaryOperation,
) -> Result<(), ChainError> {
    require_auths(
        ctx,
        &[
            (&op.required_owner_auths, AuthorityLevel::Owner),
            (&op.required_active_auths, AuthorityLevel::Active),
            (&op.required_posting_auths, AuthorityLevel::Posting),
        ],
    )?;
    require_max_len("custom id", op.id.as_bytes(), ctx.config.max_custom_id_length)?;
    require_max_len("custom data", &op.data, ctx.config.max_custom_data_size)
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active, posting};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{CustomJsonDappOperation, CustomJsonOperation};
    use sigma_models::{Amount, Operation};
    use std::collections::BTreeSet;

    fn follow(json: &str) -> Operation {
        Operation::CustomJson(CustomJsonOperation {
            required_auths: BTreeSet::new(),
            required_posting_auths: BTreeSet::from([account("alice")]),
            id: "follow".to_string(),
            json: json.to_string(),
        })
    }

    #[test]
    #[serial]
    fn custom_json_is_validated() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain
            .apply(vec![follow(r#"{"follower":"alice"}"#)], &[posting("alice")])
            .unwrap();
        assert_matches!(
            chain.apply(vec![follow("{not json")], &[posting("alice")]),
            Err(ChainError::InvalidOperation(_))
        );
        assert_matches!(
            chain.apply(vec![follow("[]")], &[posting("bob")]),
            Err(ChainError::Unauthorized(_))
        );
    }

    #[test]
    #[serial]
    fn dapp_json_charges_the_dapp_fee() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        let fee = chain.global().dapp_transaction_fee;
        let op = Operation::CustomJsonDapp(CustomJsonDappOperation {
            required_owner_auths: BTreeSet::new(),
            required_active_auths: BTreeSet::from([account("alice")]),
            required_posting_auths: BTreeSet::new(),
            id: "game".to_string(),
            json: r#"{"move":"e4"}"#.to_string(),
        });
        chain.apply(vec![op], &[active("alice")]).unwrap();
        assert_eq!(
            chain.account("alice").balance,
            Amount::from_mantissa_scale(10, 0).checked_sub(fee).unwrap()
        );
    }
}
