// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Amount, Authority, AuthorityLevel, PublicKey};
use sigma_time::SigmaTime;

/// An account and its balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountObject {
    /// identity
    pub id: ObjectId<AccountObject>,
    /// unique name
    pub name: AccountName,
    /// liquid balance
    pub balance: Amount,
    /// owner authority
    pub owner: Authority,
    /// active authority
    pub active: Authority,
    /// posting authority
    pub posting: Authority,
    /// memo key
    pub memo_key: PublicKey,
    /// free-form metadata
    pub json_metadata: String,
    /// account allowed to recover this one
    pub recovery_account: AccountName,
    /// account allowed to reset the owner after inactivity
    pub reset_account: Option<AccountName>,
    /// creation time
    pub created: SigmaTime,
    /// last owner authority change
    pub last_owner_update: SigmaTime,
    /// last authority or metadata change
    pub last_account_update: SigmaTime,
    /// last recovery
    pub last_account_recovery: SigmaTime,
    /// last block time at which the account approved a transaction
    pub last_activity_time: SigmaTime,
    /// last mining operation
    pub last_mining_time: SigmaTime,
    /// false once voting rights are declined
    pub can_vote: bool,
    /// blacklisted accounts can neither sign nor receive
    pub is_blacklisted: bool,
    /// pending savings transfers
    pub savings_withdraw_requests: u16,
    /// pending staking requests
    pub staking_requests: u16,
}

/// Accounts by name
pub const ACCOUNT_BY_NAME: Index<AccountObject> = Index::at(0);
/// Accounts by balance then name
pub const ACCOUNT_BY_BALANCE: Index<AccountObject> = Index::at(1);

impl AccountObject {
    /// Key of `name` in [`ACCOUNT_BY_NAME`]
    pub fn name_key(name: &AccountName) -> IndexKey {
        index_key!(name.as_str())
    }

    /// Authority of the given level
    pub fn authority(&self, level: AuthorityLevel) -> &Authority {
        match level {
            AuthorityLevel::Owner => &self.owner,
            AuthorityLevel::Active => &self.active,
            AuthorityLevel::Posting => &self.posting,
        }
    }
}

impl Object for AccountObject {
    const TABLE_ID: u16 = 1;
    const TABLE_NAME: &'static str = "account";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_name"),
        IndexDef::non_unique("by_balance"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            Self::name_key(&self.name),
            index_key!(self.balance.to_raw(), self.name.as_str()),
        ]
    }
}

/// Owner authority replaced at some point, usable for recovery until
/// `last_valid_time` plus the recovery period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerAuthorityHistoryObject {
    /// identity
    pub id: ObjectId<OwnerAuthorityHistoryObject>,
    /// account whose owner changed
    pub account: AccountName,
    /// replaced owner authority
    pub previous_owner_authority: Authority,
    /// time of the replacement
    pub last_valid_time: SigmaTime,
}

/// Owner history by account then time
pub const OWNER_HISTORY_BY_ACCOUNT: Index<OwnerAuthorityHistoryObject> = Index::at(0);
/// Owner history by time
pub const OWNER_HISTORY_BY_TIME: Index<OwnerAuthorityHistoryObject> = Index::at(1);

impl Object for OwnerAuthorityHistoryObject {
    const TABLE_ID: u16 = 2;
    const TABLE_NAME: &'static str = "owner_authority_history";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::non_unique("by_account"),
        IndexDef::non_unique("by_last_valid"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            index_key!(self.account.as_str(), self.last_valid_time.to_millis()),
            index_key!(self.last_valid_time.to_millis()),
        ]
    }
}
