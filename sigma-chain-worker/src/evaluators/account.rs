// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::{elapsed, require_max_len, EvaluationContext};
use sigma_chain_exports::objects::{AccountObject, OwnerAuthorityHistoryObject};
use sigma_chain_exports::ChainError;
use sigma_models::operation::{AccountAuthOperation, AccountCreateOperation, AccountUpdateOperation};
use sigma_models::{AccountName, Authority, AuthorityLevel};

/// Structural checks plus existence of every member account
fn check_authority(ctx: &EvaluationContext<'_>, authority: &Authority) -> Result<(), ChainError> {
    authority.validate()?;
    for member in authority.account_auths.keys() {
        if ctx.find_account(member)?.is_none() {
            return Err(ChainError::NotFound(format!(
                "account {} used in an authority",
                member
            )));
        }
    }
    Ok(())
}

/// Owner changes are rate limited by `owner_update_limit`
fn check_owner_update_allowed(
    ctx: &EvaluationContext<'_>,
    account: &AccountName,
) -> Result<(), ChainError> {
    let last_owner_update = ctx.get_account(account)?.last_owner_update;
    if elapsed(ctx.now(), last_owner_update) < ctx.config.owner_update_limit {
        return Err(ChainError::TooEarly(format!(
            "owner of {} was updated less than {} ago",
            account, ctx.config.owner_update_limit
        )));
    }
    Ok(())
}

/// Replaces the owner authority of `account`, keeping the previous one in
/// the history used by account recovery
pub(crate) fn replace_owner(
    ctx: &mut EvaluationContext<'_>,
    account: &AccountName,
    new_owner: Authority,
) -> Result<(), ChainError> {
    let now = ctx.now();
    let previous_owner_authority = ctx.get_account(account)?.owner.clone();
    ctx.db.create(|id| OwnerAuthorityHistoryObject {
        id,
        account: account.clone(),
        previous_owner_authority,
        last_valid_time: now,
    })?;
    ctx.modify_account(account, |object| {
        object.owner = new_owner;
        object.last_owner_update = now;
    })
}

pub(crate) fn account_create(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountCreateOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.creator, AuthorityLevel::Active)?;
    if op.fee < ctx.config.account_creation_fee {
        return Err(ChainError::InvalidOperation(format!(
            "account creation fee {} is below {}",
            op.fee, ctx.config.account_creation_fee
        )));
    }
    require_max_len(
        "json metadata",
        op.json_metadata.as_bytes(),
        ctx.config.max_json_metadata_size,
    )?;
    check_authority(ctx, &op.owner)?;
    check_authority(ctx, &op.active)?;
    check_authority(ctx, &op.posting)?;
    if ctx.find_account(&op.new_account_name)?.is_some() {
        return Err(ChainError::ConstraintViolation(format!(
            "account {} already exists",
            op.new_account_name
        )));
    }

    ctx.debit(&op.creator, op.fee)?;
    let now = ctx.now();
    ctx.db.create(|id| AccountObject {
        id,
        name: op.new_account_name.clone(),
        balance: op.fee,
        owner: op.owner.clone(),
        active: op.active.clone(),
        posting: op.posting.clone(),
        memo_key: op.memo_key.clone(),
        json_metadata: op.json_metadata.clone(),
        recovery_account: op.creator.clone(),
        reset_account: None,
        created: now,
        last_owner_update: Default::default(),
        last_account_update: now,
        last_account_recovery: Default::default(),
        last_activity_time: now,
        last_mining_time: Default::default(),
        can_vote: true,
        is_blacklisted: false,
        savings_withdraw_requests: 0,
        staking_requests: 0,
    })?;
    Ok(())
}

pub(crate) fn account_update(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountUpdateOperation,
) -> Result<(), ChainError> {
    let required = if op.owner.is_some() {
        AuthorityLevel::Owner
    } else {
        AuthorityLevel::Active
    };
    ctx.require_authority(&op.account, required)?;
    require_max_len(
        "json metadata",
        op.json_metadata.as_bytes(),
        ctx.config.max_json_metadata_size,
    )?;
    for authority in [&op.owner, &op.active, &op.posting].into_iter().flatten() {
        check_authority(ctx, authority)?;
    }
    if op.owner.is_some() {
        check_owner_update_allowed(ctx, &op.account)?;
    }

    if let Some(owner) = &op.owner {
        replace_owner(ctx, &op.account, owner.clone())?;
    }
    let now = ctx.now();
    ctx.modify_account(&op.account, |account| {
        if let Some(active) = &op.active {
            account.active = active.clone();
        }
        if let Some(posting) = &op.posting {
            account.posting = posting.clone();
        }
        account.memo_key = op.memo_key.clone();
        account.json_metadata = op.json_metadata.clone();
        account.last_account_update = now;
    })
}

/// Adds, reweights or, with weight 0, removes one account member of an
/// authority. Editing owner or active needs the owner authority, editing
/// posting needs active.
pub(crate) fn account_auth(
    ctx: &mut EvaluationContext<'_>,
    op: &AccountAuthOperation,
) -> Result<(), ChainError> {
    let required = match op.level {
        AuthorityLevel::Owner | AuthorityLevel::Active => AuthorityLevel::Owner,
        AuthorityLevel::Posting => AuthorityLevel::Active,
    };
    ctx.require_authority(&op.account, required)?;
    if ctx.find_account(&op.auth_account)?.is_none() {
        return Err(ChainError::NotFound(format!("account {}", op.auth_account)));
    }

    let mut authority = ctx.get_account(&op.account)?.authority(op.level).clone();
    if op.weight == 0 {
        if authority.account_auths.remove(&op.auth_account).is_none() {
            return Err(ChainError::NotFound(format!(
                "{} is not a member of the {:?} authority of {}",
                op.auth_account, op.level, op.account
            )));
        }
    } else {
        authority
            .account_auths
            .insert(op.auth_account.clone(), op.weight);
    }
    authority.validate()?;

    match op.level {
        AuthorityLevel::Owner => {
            check_owner_update_allowed(ctx, &op.account)?;
            replace_owner(ctx, &op.account, authority)
        }
        AuthorityLevel::Active => {
            ctx.modify_account(&op.account, |account| account.active = authority)
        }
        AuthorityLevel::Posting => {
            ctx.modify_account(&op.account, |account| account.posting = authority)
        }
    }
}
