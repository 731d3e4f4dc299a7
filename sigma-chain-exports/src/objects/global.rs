// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use sigma_chainbase::{IndexDef, IndexKey, Object, ObjectId};
use sigma_models::{AccountName, Amount, BlockId};
use sigma_time::SigmaTime;

/// Aggregate chain state, exactly one instance exists once genesis is applied
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalPropertyObject {
    /// identity
    pub id: ObjectId<DynamicGlobalPropertyObject>,
    /// number of the head block
    pub head_block_number: u32,
    /// id of the head block
    pub head_block_id: BlockId,
    /// time of the head block
    pub time: SigmaTime,
    /// producer of the head block
    pub current_bobserver: AccountName,
    /// total supply
    pub current_supply: Amount,
    /// total burned
    pub burned_supply: Amount,
    /// median of the producer proposals, refreshed every round
    pub maximum_block_size: u32,
    /// slots elapsed since genesis, filled or missed
    pub current_aslot: u64,
    /// one bit per recent slot, set when the slot produced a block.
    /// Rendered as a string, json numbers cannot hold every u128.
    #[serde_as(as = "DisplayFromStr")]
    pub recent_slots_filled: u128,
    /// number of set bits of `recent_slots_filled`, out of 128
    pub participation_count: u8,
    /// fee charged per transfer
    pub transaction_fee: Amount,
    /// fee charged per dapp payload
    pub dapp_transaction_fee: Amount,
    /// last block that can no longer be undone
    pub last_irreversible_block_num: u32,
    /// number of active block producers
    pub current_bproducer_count: u32,
    /// transfers applied since the last fee refresh
    pub total_transfer: u32,
    /// block of the last fee refresh
    pub prev_refresh_transaction_fee_block: u32,
    /// block of the next fee refresh
    pub next_refresh_transaction_fee_block: u32,
    /// blocks between two fee refreshes
    pub refresh_transaction_fee_cycle: u32,
    /// pool paying mining rewards
    pub mining_reward_account: AccountName,
    /// account receiving swapped funds
    pub swap_account: AccountName,
}

impl Object for DynamicGlobalPropertyObject {
    const TABLE_ID: u16 = 0;
    const TABLE_NAME: &'static str = "dynamic_global_property";
    const INDEXES: &'static [IndexDef] = &[];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        Vec::new()
    }
}
