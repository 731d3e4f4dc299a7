// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Authority};
use sigma_time::SigmaTime;

/// Pending recovery, created by the recovery account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecoveryRequestObject {
    /// identity
    pub id: ObjectId<AccountRecoveryRequestObject>,
    /// account to recover
    pub account_to_recover: AccountName,
    /// owner authority to install
    pub new_owner_authority: Authority,
    /// the request is dropped after this time
    pub expires: SigmaTime,
}

/// Recovery requests by account
pub const RECOVERY_REQUEST_BY_ACCOUNT: Index<AccountRecoveryRequestObject> = Index::at(0);
/// Recovery requests by expiration
pub const RECOVERY_REQUEST_BY_EXPIRATION: Index<AccountRecoveryRequestObject> = Index::at(1);

impl Object for AccountRecoveryRequestObject {
    const TABLE_ID: u16 = 3;
    const TABLE_NAME: &'static str = "account_recovery_request";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_account"),
        IndexDef::non_unique("by_expiration"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            index_key!(self.account_to_recover.as_str()),
            index_key!(self.expires.to_millis()),
        ]
    }
}

/// Scheduled change of recovery account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecoveryAccountRequestObject {
    /// identity
    pub id: ObjectId<ChangeRecoveryAccountRequestObject>,
    /// account changing its recovery account
    pub account_to_recover: AccountName,
    /// recovery account taking over
    pub recovery_account: AccountName,
    /// the change applies at this time
    pub effective_on: SigmaTime,
}

/// Recovery account changes by account
pub const CHANGE_RECOVERY_BY_ACCOUNT: Index<ChangeRecoveryAccountRequestObject> = Index::at(0);
/// Recovery account changes by effective date
pub const CHANGE_RECOVERY_BY_EFFECTIVE_DATE: Index<ChangeRecoveryAccountRequestObject> =
    Index::at(1);

impl Object for ChangeRecoveryAccountRequestObject {
    const TABLE_ID: u16 = 4;
    const TABLE_NAME: &'static str = "change_recovery_account_request";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_account"),
        IndexDef::non_unique("by_effective_date"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            index_key!(self.account_to_recover.as_str()),
            index_key!(self.effective_on.to_millis()),
        ]
    }
}

/// Scheduled loss of voting rights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineVotingRightsRequestObject {
    /// identity
    pub id: ObjectId<DeclineVotingRightsRequestObject>,
    /// account declining
    pub account: AccountName,
    /// the account loses its voting rights at this time
    pub effective_date: SigmaTime,
}

/// Decline requests by account
pub const DECLINE_VOTING_BY_ACCOUNT: Index<DeclineVotingRightsRequestObject> = Index::at(0);
/// Decline requests by effective date
pub const DECLINE_VOTING_BY_EFFECTIVE_DATE: Index<DeclineVotingRightsRequestObject> =
    Index::at(1);

impl Object for DeclineVotingRightsRequestObject {
    const TABLE_ID: u16 = 5;
    const TABLE_NAME: &'static str = "decline_voting_rights_request";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_account"),
        IndexDef::non_unique("by_effective_date"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            index_key!(self.account.as_str()),
            index_key!(self.effective_date.to_millis()),
        ]
    }
}
