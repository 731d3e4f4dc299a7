// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_chainbase::{index_key, Index, IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Amount, PublicKey};
use sigma_time::SigmaTime;

/// Block observer: a candidate producer, active once approved by root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BobserverObject {
    /// identity
    pub id: ObjectId<BobserverObject>,
    /// owning account
    pub owner: AccountName,
    /// announcement url
    pub url: String,
    /// key signing produced blocks
    pub signing_key: PublicKey,
    /// proposed maximum block size
    pub proposed_maximum_block_size: u32,
    /// transaction fee vote
    pub transaction_fee_vote: Amount,
    /// approved as block producer
    pub is_bproducer: bool,
    /// permanently excluded from production
    pub is_excepted: bool,
    /// last block produced
    pub last_confirmed_block_num: u32,
    /// slot of the last block produced
    pub last_aslot: u64,
    /// creation time
    pub created: SigmaTime,
}

/// Bobservers by owner
pub const BOBSERVER_BY_NAME: Index<BobserverObject> = Index::at(0);
/// Bobservers by producer flag then owner
pub const BOBSERVER_BY_BPRODUCER: Index<BobserverObject> = Index::at(1);

impl BobserverObject {
    /// Key of `owner` in [`BOBSERVER_BY_NAME`]
    pub fn name_key(owner: &AccountName) -> IndexKey {
        index_key!(owner.as_str())
    }

    /// Prefix of active producers in [`BOBSERVER_BY_BPRODUCER`]
    pub fn bproducer_prefix() -> IndexKey {
        index_key!(true)
    }
}

impl Object for BobserverObject {
    const TABLE_ID: u16 = 6;
    const TABLE_NAME: &'static str = "bobserver";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_name"),
        IndexDef::non_unique("by_bproducer"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            Self::name_key(&self.owner),
            index_key!(self.is_bproducer, self.owner.as_str()),
        ]
    }
}
