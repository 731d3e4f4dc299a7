// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Amount};
use sigma_time::SigmaTime;

/// Funds escrowed by a savings transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsWithdrawObject {
    /// identity
    pub id: ObjectId<SavingsWithdrawObject>,
    /// sender
    pub from: AccountName,
    /// recipient
    pub to: AccountName,
    /// sender-chosen request number
    pub request_id: u32,
    /// escrowed amount
    pub amount: Amount,
    /// memo
    pub memo: String,
    /// time of the request
    pub request_time: SigmaTime,
    /// the recipient may conclude from this time on
    pub complete: SigmaTime,
}

/// Savings transfers by sender and request id
pub const SAVINGS_BY_FROM_RID: Index<SavingsWithdrawObject> = Index::at(0);
/// Savings transfers by recipient then completion time
pub const SAVINGS_BY_TO_COMPLETE: Index<SavingsWithdrawObject> = Index::at(1);

impl SavingsWithdrawObject {
    /// Key in [`SAVINGS_BY_FROM_RID`]
    pub fn request_key(from: &AccountName, request_id: u32) -> IndexKey {
        index_key!(from.as_str(), request_id)
    }
}

impl Object for SavingsWithdrawObject {
    const TABLE_ID: u16 = 7;
    const TABLE_NAME: &'static str = "savings_withdraw";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_from_rid"),
        IndexDef::non_unique("by_to_complete"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            Self::request_key(&self.from, self.request_id),
            index_key!(self.to.as_str(), self.complete.to_millis()),
        ]
    }
}
