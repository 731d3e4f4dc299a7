// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Serialize};
use sigma_models::config::constants::*;
use sigma_models::{AccountName, Amount, PublicKey};
use sigma_time::SigmaTime;

/// Chain state machine configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// time of the genesis state
    pub genesis_time: SigmaTime,
    /// time between two slots
    pub block_interval: SigmaTime,
    /// supply credited to the root account at genesis
    pub init_supply: Amount,
    /// chain administrator
    pub root_account: AccountName,
    /// key of the root account at genesis
    pub root_public_key: PublicKey,
    /// pool paying mining rewards
    pub mining_reward_account: AccountName,
    /// account receiving swapped funds
    pub swap_account: AccountName,
    /// staking fund created at genesis
    pub genesis_fund_name: String,
    /// producers per round, also the round length in blocks
    pub max_bproducers: u32,
    /// share of producers (percent) confirming a block for it to become irreversible
    pub irreversible_threshold_percent: u32,
    /// maximal serialized size of a transaction
    pub max_transaction_size: u32,
    /// lowest block size producers can vote for
    pub min_block_size_limit: u32,
    /// highest block size producers can vote for
    pub max_block_size_limit: u32,
    /// maximum block size at genesis
    pub initial_maximum_block_size: u32,
    /// maximal number of transactions in a block
    pub max_transactions_per_block: u32,
    /// maximal distance between head time and transaction expiration
    pub max_time_until_expiration: SigmaTime,
    /// blocks between two transaction fee refreshes
    pub refresh_transaction_fee_cycle: u32,
    /// transaction fee at genesis
    pub initial_transaction_fee: Amount,
    /// lowest fee vote
    pub min_transaction_fee: Amount,
    /// highest fee vote
    pub max_transaction_fee: Amount,
    /// fee of decentralized application payloads
    pub dapp_transaction_fee: Amount,
    /// minimal fee to create an account
    pub account_creation_fee: Amount,
    /// window during which a previous owner authority can recover an account
    pub owner_auth_recovery_period: SigmaTime,
    /// lifetime of an account recovery request
    pub account_recovery_request_expiration_period: SigmaTime,
    /// minimal time between two owner changes
    pub owner_update_limit: SigmaTime,
    /// delay before declining voting rights takes effect
    pub decline_voting_rights_duration: SigmaTime,
    /// inactivity after which the reset account may replace the owner
    pub reset_account_delay: SigmaTime,
    /// escrow time of savings transfers
    pub savings_withdraw_time: SigmaTime,
    /// pending savings transfers per account
    pub savings_withdraw_request_limit: u16,
    /// length of a staking month
    pub staking_month: SigmaTime,
    /// longest staking period in months
    pub max_staking_months: u8,
    /// pending staking requests per account
    pub staking_request_limit: u16,
    /// reward of a mining operation
    pub mining_reward: Amount,
    /// minimal time between two mining operations of an account
    pub mining_interval: SigmaTime,
    /// share of the mining reward paid to the block producer, in basis points
    pub mining_producer_share: u32,
    /// maximal memo length
    pub max_memo_size: u32,
    /// maximal url length
    pub max_url_length: u32,
    /// maximal json metadata length
    pub max_json_metadata_size: u32,
    /// maximal custom payload id length
    pub max_custom_id_length: u32,
    /// maximal custom payload size
    pub max_custom_data_size: u32,
    /// maximal fund name length
    pub max_fund_name_length: u32,
    /// maximal swap target length
    pub max_swap_target_length: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_time: GENESIS_TIME,
            block_interval: BLOCK_INTERVAL,
            init_supply: INIT_SUPPLY,
            root_account: ROOT_ACCOUNT.clone(),
            root_public_key: ROOT_PUBLIC_KEY.clone(),
            mining_reward_account: MINING_REWARD_ACCOUNT.clone(),
            swap_account: SWAP_ACCOUNT.clone(),
            genesis_fund_name: GENESIS_FUND_NAME.to_string(),
            max_bproducers: MAX_BPRODUCERS,
            irreversible_threshold_percent: IRREVERSIBLE_THRESHOLD_PERCENT,
            max_transaction_size: MAX_TRANSACTION_SIZE,
            min_block_size_limit: MIN_BLOCK_SIZE_LIMIT,
            max_block_size_limit: MAX_BLOCK_SIZE_LIMIT,
            initial_maximum_block_size: INITIAL_MAXIMUM_BLOCK_SIZE,
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
            max_time_until_expiration: MAX_TIME_UNTIL_EXPIRATION,
            refresh_transaction_fee_cycle: REFRESH_TRANSACTION_FEE_CYCLE,
            initial_transaction_fee: INITIAL_TRANSACTION_FEE,
            min_transaction_fee: MIN_TRANSACTION_FEE,
            max_transaction_fee: MAX_TRANSACTION_FEE,
            dapp_transaction_fee: DAPP_TRANSACTION_FEE,
            account_creation_fee: ACCOUNT_CREATION_FEE,
            owner_auth_recovery_period: OWNER_AUTH_RECOVERY_PERIOD,
            account_recovery_request_expiration_period: ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD,
            owner_update_limit: OWNER_UPDATE_LIMIT,
            decline_voting_rights_duration: DECLINE_VOTING_RIGHTS_DURATION,
            reset_account_delay: RESET_ACCOUNT_DELAY,
            savings_withdraw_time: SAVINGS_WITHDRAW_TIME,
            savings_withdraw_request_limit: SAVINGS_WITHDRAW_REQUEST_LIMIT,
            staking_month: STAKING_MONTH,
            max_staking_months: MAX_STAKING_MONTHS,
            staking_request_limit: STAKING_REQUEST_LIMIT,
            mining_reward: MINING_REWARD,
            mining_interval: MINING_INTERVAL,
            mining_producer_share: MINING_PRODUCER_SHARE,
            max_memo_size: MAX_MEMO_SIZE,
            max_url_length: MAX_URL_LENGTH,
            max_json_metadata_size: MAX_JSON_METADATA_SIZE,
            max_custom_id_length: MAX_CUSTOM_ID_LENGTH,
            max_custom_data_size: MAX_CUSTOM_DATA_SIZE,
            max_fund_name_length: MAX_FUND_NAME_LENGTH,
            max_swap_target_length: MAX_SWAP_TARGET_LENGTH,
        }
    }
}

impl ChainConfig {
    /// Absolute slot of `time`: number of block intervals since genesis
    pub fn slot_at(&self, time: SigmaTime) -> u64 {
        time.saturating_sub(self.genesis_time)
            .checked_div_time(self.block_interval)
            .unwrap_or(0)
    }

    /// Number of producer confirmations below which blocks stay reversible
    pub fn irreversibility_offset(&self, producer_count: usize) -> usize {
        (100 - self.irreversible_threshold_percent.min(100)) as usize * producer_count / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_protocol_constants() {
        let config = ChainConfig::default();
        assert_eq!(config.root_account.as_str(), "sigmaengine");
        assert_eq!(config.refresh_transaction_fee_cycle, 28_800);
        assert_eq!(config.slot_at(config.genesis_time), 0);
        assert_eq!(
            config.slot_at(config.genesis_time.saturating_add(SigmaTime::from_secs(9))),
            3
        );
        assert_eq!(config.irreversibility_offset(21), 5);
    }

    #[test]
    fn config_is_serde_friendly() {
        let config = ChainConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
