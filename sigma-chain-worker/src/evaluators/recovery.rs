// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Account recovery, recovery account changes, reset accounts and voting
//! rights. Every delay comes from the chain configuration.

use crate::context::{deadline, elapsed, EvaluationContext};
use crate::evaluators::account::replace_owner;
use sigma_chain_exports::objects::{
    AccountObject, AccountRecoveryRequestObject, ChangeRecoveryAccountRequestObject,
    DeclineVotingRightsRequestObject, OwnerAuthorityHistoryObject, CHANGE_RECOVERY_BY_ACCOUNT,
    DECLINE_VOTING_BY_ACCOUNT, OWNER_HISTORY_BY_ACCOUNT, RECOVERY_REQUEST_BY_ACCOUNT,
};
use sigma_chain_exports::ChainError;
use sigma_chainbase::index_key;
use sigma_models::operation::{
    ChangeRecoveryAccountOperation, DeclineVotingRightsOperation, RecoverAccountOperation,
    RequestAccountRecoveryOperation, ResetAccountOperation, SetResetAccountOperation,
};
use sigma_models::AuthorityLevel;

/// Created, updated or, with a zero threshold authority, cancelled by the
/// recovery account of `account_to_recover`
pub(crate) fn request_account_recovery(
    ctx: &mut EvaluationContext<'_>,
    op: &RequestAccountRecoveryOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.recovery_account, AuthorityLevel::Active)?;
    let account = ctx.get_account(&op.account_to_recover)?;
    if account.recovery_account != op.recovery_account {
        return Err(ChainError::Unauthorized(format!(
            "{} is not the recovery account of {}",
            op.recovery_account, op.account_to_recover
        )));
    }
    let existing = ctx
        .db
        .find_by(
            RECOVERY_REQUEST_BY_ACCOUNT,
            &AccountObject::name_key(&op.account_to_recover),
        )?
        .map(|request| request.id);

    if op.new_owner_authority.weight_threshold == 0 {
        let id = existing.ok_or_else(|| {
            ChainError::NotFound(format!(
                "recovery request for {}",
                op.account_to_recover
            ))
        })?;
        ctx.db.remove(id)?;
        return Ok(());
    }
    op.new_owner_authority.validate()?;
    let expires = deadline(
        ctx.now(),
        ctx.config.account_recovery_request_expiration_period,
    )?;
    match existing {
        Some(id) => ctx.db.modify(id, |request| {
            request.new_owner_authority = op.new_owner_authority.clone();
            request.expires = expires;
        })?,
        None => {
            ctx.db.create(|id| AccountRecoveryRequestObject {
                id,
                account_to_recover: op.account_to_recover.clone(),
                new_owner_authority: op.new_owner_authority.clone(),
                expires,
            })?;
        }
    }
    Ok(())
}

/// Replaces the owner with the requested one. The transaction proves control
/// of both the new owner authority and an owner authority that was valid
/// within the recovery period; the current owner plays no part.
pub(crate) fn recover_account(
    ctx: &mut EvaluationContext<'_>,
    op: &RecoverAccountOperation,
) -> Result<(), ChainError> {
    for (authority, what) in [
        (&op.new_owner_authority, "new"),
        (&op.recent_owner_authority, "recent"),
    ] {
        if !ctx.is_satisfied(authority, AuthorityLevel::Owner) {
            return Err(ChainError::Unauthorized(format!(
                "{} owner authority of {} is not satisfied",
                what, op.account_to_recover
            )));
        }
    }
    let now = ctx.now();
    let account = ctx.get_account(&op.account_to_recover)?;
    if elapsed(now, account.last_account_recovery) < ctx.config.owner_update_limit {
        return Err(ChainError::TooEarly(format!(
            "account {} was recovered less than {} ago",
            op.account_to_recover, ctx.config.owner_update_limit
        )));
    }
    let request = ctx
        .db
        .find_by(
            RECOVERY_REQUEST_BY_ACCOUNT,
            &AccountObject::name_key(&op.account_to_recover),
        )?
        .ok_or_else(|| {
            ChainError::NotFound(format!("recovery request for {}", op.account_to_recover))
        })?;
    if request.new_owner_authority != op.new_owner_authority {
        return Err(ChainError::InvalidOperation(
            "new owner authority does not match the recovery request".to_string(),
        ));
    }
    let request_id = request.id;
    let history_prefix = index_key!(op.account_to_recover.as_str());
    let recent_owner_found = ctx
        .db
        .iter_by_prefix(OWNER_HISTORY_BY_ACCOUNT, &history_prefix)?
        .any(|history: &OwnerAuthorityHistoryObject| {
            history.previous_owner_authority == op.recent_owner_authority
                && elapsed(now, history.last_valid_time) < ctx.config.owner_auth_recovery_period
        });
    if !recent_owner_found {
        return Err(ChainError::InvalidOperation(format!(
            "recent owner authority of {} not found in the recovery window",
            op.account_to_recover
        )));
    }

    ctx.db.remove(request_id)?;
    replace_owner(ctx, &op.account_to_recover, op.new_owner_authority.clone())?;
    ctx.modify_account(&op.account_to_recover, |account| {
        account.last_account_recovery = now
    })
}

/// Schedules the change of the recovery account. Asking for the current
/// recovery account cancels a pending change.
pub(crate) fn change_recovery_account(
    ctx: &mut EvaluationContext<'_>,
    op: &ChangeRecoveryAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.account_to_recover, AuthorityLevel::Owner)?;
    ctx.get_account(&op.new_recovery_account)?;
    let current = ctx.get_account(&op.account_to_recover)?.recovery_account.clone();
    let existing = ctx
        .db
        .find_by(
            CHANGE_RECOVERY_BY_ACCOUNT,
            &AccountObject::name_key(&op.account_to_recover),
        )?
        .map(|request| request.id);
    let effective_on = deadline(ctx.now(), ctx.config.owner_auth_recovery_period)?;

    match (existing, current == op.new_recovery_account) {
        (Some(id), true) => {
            ctx.db.remove(id)?;
        }
        (Some(id), false) => ctx.db.modify(id, |request| {
            request.recovery_account = op.new_recovery_account.clone();
            request.effective_on = effective_on;
        })?,
        (None, false) => {
            ctx.db.create(|id| ChangeRecoveryAccountRequestObject {
                id,
                account_to_recover: op.account_to_recover.clone(),
                recovery_account: op.new_recovery_account.clone(),
                effective_on,
            })?;
        }
        (None, true) => {
            return Err(ChainError::InvalidOperation(format!(
                "{} is already the recovery account of {}",
                op.new_recovery_account, op.account_to_recover
            )))
        }
    }
    Ok(())
}

/// Schedules or cancels the loss of voting rights
pub(crate) fn decline_voting_rights(
    ctx: &mut EvaluationContext<'_>,
    op: &DeclineVotingRightsOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.account, AuthorityLevel::Owner)?;
    let can_vote = ctx.get_account(&op.account)?.can_vote;
    let existing = ctx
        .db
        .find_by(DECLINE_VOTING_BY_ACCOUNT, &AccountObject::name_key(&op.account))?
        .map(|request| request.id);

    if op.decline {
        if !can_vote {
            return Err(ChainError::InvalidOperation(format!(
                "{} already declined its voting rights",
                op.account
            )));
        }
        if existing.is_some() {
            return Err(ChainError::ConstraintViolation(format!(
                "{} already has a pending decline request",
                op.account
            )));
        }
        let effective_date = deadline(ctx.now(), ctx.config.decline_voting_rights_duration)?;
        ctx.db.create(|id| DeclineVotingRightsRequestObject {
            id,
            account: op.account.clone(),
            effective_date,
        })?;
    } else {
        let id = existing.ok_or_else(|| {
            ChainError::NotFound(format!("decline voting rights request of {}", op.account))
        })?;
        ctx.db.remove(id)?;
    }
    Ok(())
}

/// The reset account takes over the owner authority of an account inactive
/// for at least the reset delay
pub(crate) fn reset_account(
    ctx: &mut EvaluationContext<'_>,
    op: &ResetAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.reset_account, AuthorityLevel::Active)?;
    let account = ctx.get_account(&op.account_to_reset)?;
    if account.reset_account.as_ref() != Some(&op.reset_account) {
        return Err(ChainError::Unauthorized(format!(
            "{} is not the reset account of {}",
            op.reset_account, op.account_to_reset
        )));
    }
    if elapsed(ctx.now(), account.last_activity_time) < ctx.config.reset_account_delay {
        return Err(ChainError::TooEarly(format!(
            "account {} was active less than {} ago",
            op.account_to_reset, ctx.config.reset_account_delay
        )));
    }
    op.new_owner_authority.validate()?;

    replace_owner(ctx, &op.account_to_reset, op.new_owner_authority.clone())
}

pub(crate) fn set_reset_account(
    ctx: &mut EvaluationContext<'_>,
    op: &SetResetAccountOperation,
) -> Result<(), ChainError> {
    ctx.require_authority(&op.account, AuthorityLevel::Owner)?;
    let current = &ctx.get_account(&op.account)?.reset_account;
    if current != &op.current_reset_account {
        return Err(ChainError::InvalidOperation(format!(
            "current reset account of {} does not match",
            op.account
        )));
    }
    if op.current_reset_account == op.reset_account {
        return Err(ChainError::InvalidOperation(
            "new reset account is the current one".to_string(),
        ));
    }
    if let Some(reset_account) = &op.reset_account {
        ctx.get_account(reset_account)?;
    }

    let reset_account = op.reset_account.clone();
    ctx.modify_account(&op.account, |account| account.reset_account = reset_account)
}

#[cfg(test)]
mod tests {
    use crate::tests::tools::TestChain;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use sigma_chain_exports::test_exports::{account, active, key_authority, owner, test_public_key};
    use sigma_chain_exports::ChainError;
    use sigma_models::operation::{
        AccountUpdateOperation, ChangeRecoveryAccountOperation, DeclineVotingRightsOperation,
        RecoverAccountOperation, RequestAccountRecoveryOperation, ResetAccountOperation,
        SetResetAccountOperation,
    };
    use sigma_models::{Amount, Operation};

    fn update_owner(name: &str, seed: &str) -> Operation {
        Operation::AccountUpdate(AccountUpdateOperation {
            account: account(name),
            owner: Some(key_authority(seed)),
            active: None,
            posting: None,
            memo_key: test_public_key(seed),
            json_metadata: String::new(),
        })
    }

    #[test]
    #[serial]
    fn stolen_account_is_recovered() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        let original_owner = chain.account("alice").owner;
        chain
            .apply(vec![update_owner("alice", "thief")], &[owner("alice")])
            .unwrap();

        let request = Operation::RequestAccountRecovery(RequestAccountRecoveryOperation {
            recovery_account: account("sigmaengine"),
            account_to_recover: account("alice"),
            new_owner_authority: key_authority("alice-new"),
        });
        chain.apply(vec![request], &[active("sigmaengine")]).unwrap();

        let recover = |recent: &str| {
            Operation::RecoverAccount(RecoverAccountOperation {
                account_to_recover: account("alice"),
                new_owner_authority: key_authority("alice-new"),
                recent_owner_authority: key_authority(recent),
            })
        };
        // the thief holds the current owner but none of the recovery keys
        assert_matches!(
            chain.apply(vec![recover("alice")], &[owner("alice"), active("sigmaengine")]),
            Err(ChainError::Unauthorized(_))
        );
        assert_matches!(
            chain.apply_signed(vec![recover("alice")], &[], &[test_public_key("alice-new")]),
            Err(ChainError::Unauthorized(_))
        );
        assert_matches!(
            chain.apply_signed(
                vec![recover("someone-else")],
                &[],
                &[test_public_key("alice-new"), test_public_key("someone-else")]
            ),
            Err(ChainError::InvalidOperation(_))
        );
        assert_eq!(original_owner, key_authority("alice"));
        assert_eq!(chain.account("alice").owner, key_authority("thief"));

        chain
            .apply_signed(
                vec![recover("alice")],
                &[],
                &[test_public_key("alice-new"), test_public_key("alice")],
            )
            .unwrap();
        assert_eq!(chain.account("alice").owner, key_authority("alice-new"));
        assert_eq!(chain.recovery_request_count(), 0);
    }

    #[test]
    #[serial]
    fn recovery_request_is_restricted_and_expires() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(10, 0));
        let request = |recovery: &str| {
            Operation::RequestAccountRecovery(RequestAccountRecoveryOperation {
                recovery_account: account(recovery),
                account_to_recover: account("alice"),
                new_owner_authority: key_authority("alice-new"),
            })
        };
        assert_matches!(
            chain.apply(vec![request("bob")], &[active("bob")]),
            Err(ChainError::Unauthorized(_))
        );
        chain
            .apply(vec![request("sigmaengine")], &[active("sigmaengine")])
            .unwrap();
        assert_eq!(chain.recovery_request_count(), 1);
        // 30 second expiration with 3 second blocks
        chain.skip_blocks(10);
        assert_eq!(chain.recovery_request_count(), 0);
    }

    #[test]
    #[serial]
    fn recovery_account_change_matures() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(10, 0));
        let change = Operation::ChangeRecoveryAccount(ChangeRecoveryAccountOperation {
            account_to_recover: account("alice"),
            new_recovery_account: account("bob"),
        });
        chain.apply(vec![change], &[owner("alice")]).unwrap();
        assert_eq!(chain.account("alice").recovery_account, account("sigmaengine"));

        // 60 second period with 3 second blocks
        let first = chain.global().head_block_number + 1;
        let last = chain.skip_blocks(20);
        assert_eq!(chain.account("alice").recovery_account, account("bob"));
        let fills: Vec<_> = (first..=last)
            .flat_map(|block| chain.virtual_operations(block))
            .collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].op.name(), "fill_change_recovery_account");
    }

    #[test]
    #[serial]
    fn declined_voting_rights() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        let decline = |decline: bool| {
            Operation::DeclineVotingRights(DeclineVotingRightsOperation {
                account: account("alice"),
                decline,
            })
        };
        chain.apply(vec![decline(true)], &[owner("alice")]).unwrap();
        assert_matches!(
            chain.apply(vec![decline(true)], &[owner("alice")]),
            Err(ChainError::ConstraintViolation(_))
        );
        chain.apply(vec![decline(false)], &[owner("alice")]).unwrap();
        chain.apply(vec![decline(true)], &[owner("alice")]).unwrap();
        assert!(chain.account("alice").can_vote);
        chain.skip_blocks(3);
        assert!(!chain.account("alice").can_vote);
    }

    #[test]
    #[serial]
    fn reset_account_after_inactivity() {
        let mut chain = TestChain::new();
        chain.create_account("alice", Amount::from_mantissa_scale(10, 0));
        chain.create_account("bob", Amount::from_mantissa_scale(10, 0));
        let set_reset = Operation::SetResetAccount(SetResetAccountOperation {
            account: account("alice"),
            current_reset_account: None,
            reset_account: Some(account("bob")),
        });
        chain.apply(vec![set_reset], &[owner("alice")]).unwrap();

        let reset = Operation::ResetAccount(ResetAccountOperation {
            reset_account: account("bob"),
            account_to_reset: account("alice"),
            new_owner_authority: key_authority("bob-controlled"),
        });
        assert_matches!(
            chain.apply(vec![reset.clone()], &[active("bob")]),
            Err(ChainError::TooEarly(_))
        );
        // 15 second delay with 3 second blocks
        chain.skip_blocks(5);
        chain.apply(vec![reset], &[active("bob")]).unwrap();
        assert_eq!(chain.account("alice").owner, key_authority("bob-controlled"));
    }
}
