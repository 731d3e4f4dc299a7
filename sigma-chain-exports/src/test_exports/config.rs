// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::ChainConfig;
use sigma_models::Amount;
use sigma_time::SigmaTime;

/// Configuration with short periods so that maturation paths are reachable
/// within a handful of 3 second blocks
pub fn test_chain_config() -> ChainConfig {
    ChainConfig {
        max_bproducers: 3,
        refresh_transaction_fee_cycle: 5,
        owner_auth_recovery_period: SigmaTime::from_secs(60),
        account_recovery_request_expiration_period: SigmaTime::from_secs(30),
        owner_update_limit: SigmaTime::from_secs(6),
        decline_voting_rights_duration: SigmaTime::from_secs(9),
        reset_account_delay: SigmaTime::from_secs(15),
        savings_withdraw_time: SigmaTime::from_secs(9),
        savings_withdraw_request_limit: 2,
        staking_month: SigmaTime::from_secs(6),
        max_staking_months: 3,
        staking_request_limit: 2,
        mining_reward: Amount::from_mantissa_scale(10, 0),
        mining_interval: SigmaTime::from_secs(6),
        ..ChainConfig::default()
    }
}
