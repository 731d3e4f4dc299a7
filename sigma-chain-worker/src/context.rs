// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Evaluation context of one operation.
//!
//! The context borrows the store session of the enclosing transaction: every
//! mutation made through it is reverted if the transaction is rejected.

use crate::global_state::{get_global_state, update_global_state};
use crate::recorder::Recorder;
use sigma_chain_exports::objects::{AccountObject, DynamicGlobalPropertyObject, ACCOUNT_BY_NAME};
use sigma_chain_exports::{ChainConfig, ChainError, OperationCoordinates};
use sigma_chainbase::Database;
use sigma_models::{AccountName, Amount, Approval, Authority, AuthorityLevel, Operation, PublicKey};
use sigma_time::SigmaTime;
use std::collections::BTreeSet;

pub(crate) struct EvaluationContext<'a> {
    /// store, inside the transaction session
    pub db: &'a mut Database,
    /// chain configuration
    pub config: &'a ChainConfig,
    /// virtual operation sink
    pub recorder: &'a mut Recorder,
    /// verified approvals of the enclosing transaction
    pub approvals: &'a BTreeSet<Approval>,
    /// verified signing keys of the enclosing transaction
    pub signing_keys: &'a BTreeSet<PublicKey>,
    /// position of the operation being evaluated
    pub coordinates: OperationCoordinates,
    /// producer of the block being applied
    pub producer: AccountName,
}

impl<'a> EvaluationContext<'a> {
    /// time of the block being applied
    pub fn now(&self) -> SigmaTime {
        self.coordinates.timestamp
    }

    pub fn global_state(&self) -> Result<&DynamicGlobalPropertyObject, ChainError> {
        get_global_state(&*self.db)
    }

    pub fn update_global_state<F>(&mut self, mutator: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut DynamicGlobalPropertyObject),
    {
        update_global_state(&mut *self.db, mutator)
    }

    pub fn find_account(&self, name: &AccountName) -> Result<Option<&AccountObject>, ChainError> {
        Ok(self
            .db
            .find_by(ACCOUNT_BY_NAME, &AccountObject::name_key(name))?)
    }

    pub fn get_account(&self, name: &AccountName) -> Result<&AccountObject, ChainError> {
        self.find_account(name)?
            .ok_or_else(|| ChainError::NotFound(format!("account {}", name)))
    }

    pub fn modify_account<F>(&mut self, name: &AccountName, mutator: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut AccountObject),
    {
        let id = self.get_account(name)?.id;
        self.db.modify(id, mutator)?;
        Ok(())
    }

    /// Checks that `name` exists, is not blacklisted and approved the
    /// transaction at `level` or above.
    ///
    /// Besides a direct approval, the authority of `name` at `level` is also
    /// satisfied when its signing keys and approving members reach the weight
    /// threshold (see `is_satisfied`).
    pub fn require_authority(
        &self,
        name: &AccountName,
        level: AuthorityLevel,
    ) -> Result<(), ChainError> {
        let account = self.get_account(name)?;
        if account.is_blacklisted {
            return Err(ChainError::Unauthorized(format!(
                "account {} is blacklisted",
                name
            )));
        }
        if self.is_approved(name, level) {
            return Ok(());
        }
        if self.is_satisfied(account.authority(level), level) {
            return Ok(());
        }
        Err(ChainError::Unauthorized(format!(
            "missing {:?} authority of {}",
            level, name
        )))
    }

    /// true if the signing keys and approving members of `authority` reach
    /// its weight threshold. Members approve with their active authority, or
    /// their posting authority for a posting level `authority`.
    pub fn is_satisfied(&self, authority: &Authority, level: AuthorityLevel) -> bool {
        let member_level = match level {
            AuthorityLevel::Posting => AuthorityLevel::Posting,
            AuthorityLevel::Active | AuthorityLevel::Owner => AuthorityLevel::Active,
        };
        let members = authority
            .account_auths
            .iter()
            .filter(|(member, _)| self.is_approved(member, member_level))
            .map(|(_, weight)| u64::from(*weight));
        let keys = authority
            .key_auths
            .iter()
            .filter(|(key, _)| self.signing_keys.contains(*key))
            .map(|(_, weight)| u64::from(*weight));
        let weight: u64 = members.chain(keys).sum();
        authority.weight_threshold > 0 && weight >= u64::from(authority.weight_threshold)
    }

    fn is_approved(&self, name: &AccountName, level: AuthorityLevel) -> bool {
        self.approvals
            .iter()
            .any(|approval| &approval.account == name && approval.level.satisfies(level))
    }

    /// Active authority of the root account
    pub fn require_root(&self) -> Result<(), ChainError> {
        self.require_authority(&self.config.root_account, AuthorityLevel::Active)
    }

    /// Checks that `name` exists and may receive funds
    pub fn require_receiver(&self, name: &AccountName) -> Result<(), ChainError> {
        match self.find_account(name)? {
            None => Err(ChainError::InvalidOperation(format!(
                "recipient {} does not exist",
                name
            ))),
            Some(account) if account.is_blacklisted => Err(ChainError::InvalidOperation(format!(
                "recipient {} is blacklisted",
                name
            ))),
            Some(_) => Ok(()),
        }
    }

    pub fn credit(&mut self, name: &AccountName, amount: Amount) -> Result<(), ChainError> {
        let balance = self
            .get_account(name)?
            .balance
            .checked_add(amount)
            .ok_or_else(|| {
                ChainError::InvalidOperation(format!("balance overflow on account {}", name))
            })?;
        self.modify_account(name, |account| account.balance = balance)
    }

    pub fn debit(&mut self, name: &AccountName, amount: Amount) -> Result<(), ChainError> {
        let balance = self
            .get_account(name)?
            .balance
            .checked_sub(amount)
            .ok_or_else(|| {
                ChainError::InvalidOperation(format!(
                    "insufficient balance on account {} to pay {}",
                    name, amount
                ))
            })?;
        self.modify_account(name, |account| account.balance = balance)
    }

    /// Debits `from` first, so a failing move leaves `to` untouched
    pub fn move_funds(
        &mut self,
        from: &AccountName,
        to: &AccountName,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Appends a virtual operation at the coordinates of the current operation
    pub fn emit_virtual(&mut self, op: Operation) -> Result<(), ChainError> {
        self.recorder.record(&mut *self.db, op, &self.coordinates, true)?;
        Ok(())
    }
}

pub(crate) fn require_positive(amount: Amount) -> Result<(), ChainError> {
    if amount.is_zero() {
        return Err(ChainError::InvalidOperation(
            "amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Checks that `value` is at most `max` bytes long
pub(crate) fn require_max_len(what: &str, value: &[u8], max: u32) -> Result<(), ChainError> {
    if value.len() > max as usize {
        return Err(ChainError::InvalidOperation(format!(
            "{} of {} bytes exceeds the limit of {}",
            what,
            value.len(),
            max
        )));
    }
    Ok(())
}

/// Time elapsed since `since`, zero if `since` is in the future
pub(crate) fn elapsed(now: SigmaTime, since: SigmaTime) -> SigmaTime {
    now.saturating_sub(since)
}

/// `start + period`, failing as a consistency fault on overflow
pub(crate) fn deadline(start: SigmaTime, period: SigmaTime) -> Result<SigmaTime, ChainError> {
    start
        .checked_add(period)
        .map_err(|err| ChainError::ConsistencyFault(err.to_string()))
}
