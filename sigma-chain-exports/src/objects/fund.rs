// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Amount};
use sigma_time::SigmaTime;
use std::collections::BTreeMap;

/// Staking fund pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundObject {
    /// identity
    pub id: ObjectId<FundObject>,
    /// unique fund name
    pub name: String,
    /// funds available to pay interest
    pub balance: Amount,
    /// interest reserved for pending staking requests
    pub withdraw_balance: Amount,
    /// interest in basis points, by staking duration in months
    pub interest_rates: BTreeMap<u8, u16>,
}

/// Funds by name
pub const FUND_BY_NAME: Index<FundObject> = Index::at(0);

impl FundObject {
    /// Key of `name` in [`FUND_BY_NAME`]
    pub fn name_key(name: &str) -> IndexKey {
        index_key!(name)
    }

    /// Interest rate for `month` months, zero when none was set
    pub fn interest_rate(&self, month: u8) -> u16 {
        self.interest_rates.get(&month).copied().unwrap_or(0)
    }
}

impl Object for FundObject {
    const TABLE_ID: u16 = 8;
    const TABLE_NAME: &'static str = "fund";
    const INDEXES: &'static [IndexDef] = &[IndexDef::unique("by_name")];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![Self::name_key(&self.name)]
    }
}

/// Principal locked in a fund, with its reserved interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundWithdrawObject {
    /// identity
    pub id: ObjectId<FundWithdrawObject>,
    /// staker
    pub from: AccountName,
    /// fund name
    pub fund_name: String,
    /// staker-chosen request number
    pub request_id: u32,
    /// locked principal
    pub amount: Amount,
    /// interest paid on conclusion
    pub interest: Amount,
    /// time of the request
    pub request_time: SigmaTime,
    /// unlock time
    pub complete: SigmaTime,
}

/// Staking requests by staker, fund and request id
pub const FUND_WITHDRAW_BY_FROM_FUND_RID: Index<FundWithdrawObject> = Index::at(0);
/// Staking requests by unlock time
pub const FUND_WITHDRAW_BY_COMPLETE: Index<FundWithdrawObject> = Index::at(1);

impl FundWithdrawObject {
    /// Key in [`FUND_WITHDRAW_BY_FROM_FUND_RID`]
    pub fn request_key(from: &AccountName, fund_name: &str, request_id: u32) -> IndexKey {
        index_key!(from.as_str(), fund_name, request_id)
    }
}

impl Object for FundWithdrawObject {
    const TABLE_ID: u16 = 9;
    const TABLE_NAME: &'static str = "fund_withdraw";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_from_fund_rid"),
        IndexDef::non_unique("by_complete"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            Self::request_key(&self.from, &self.fund_name, self.request_id),
            index_key!(self.complete.to_millis()),
        ]
    }
}
