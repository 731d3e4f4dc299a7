// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>
//! DEFAULT VALUES USED TO INITIALIZE THE CHAIN CONFIGURATION
//!
//! Changing one of the following values is considered as a breaking change.
use crate::account::{AccountName, PublicKey};
use crate::amount::Amount;
use sigma_time::SigmaTime;
use std::str::FromStr;

/// Number of decimals of an amount
pub const AMOUNT_DECIMAL_SCALE: u32 = 3;
/// Raw units per coin
pub const AMOUNT_DECIMAL_FACTOR: u64 = 1_000;
/// 100% expressed in basis points
pub const PERCENT_100: u32 = 10_000;

/// Minimal length of an account name, and of each of its labels
pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;
/// Maximal length of an account name
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;
/// Prefix of the text form of public keys
pub const PUBLIC_KEY_PREFIX: &str = "SGT";
/// Maximal length of the text form of a public key
pub const MAX_PUBLIC_KEY_LENGTH: usize = 128;
/// Maximal number of members of an authority
pub const MAX_AUTHORITY_MEMBERSHIP: usize = 10;

/// Time between two slots
pub const BLOCK_INTERVAL: SigmaTime = SigmaTime::from_secs(3);
/// Number of block producers, also the length of a round in blocks
pub const MAX_BPRODUCERS: u32 = 21;
/// Share of producers (percent) that must confirm a block for it to become irreversible
pub const IRREVERSIBLE_THRESHOLD_PERCENT: u32 = 75;
/// Maximal serialized size of a transaction
pub const MAX_TRANSACTION_SIZE: u32 = 64 * 1024;
/// Lower bound of the maximum block size producers can vote for
pub const MIN_BLOCK_SIZE_LIMIT: u32 = MAX_TRANSACTION_SIZE;
/// Upper bound of the maximum block size producers can vote for
pub const MAX_BLOCK_SIZE_LIMIT: u32 = 2 * 1024 * 1024;
/// Maximum block size at genesis
pub const INITIAL_MAXIMUM_BLOCK_SIZE: u32 = 128 * 1024;
/// Maximal number of transactions in a block
pub const MAX_TRANSACTIONS_PER_BLOCK: u32 = 10_000;
/// Maximal number of operations in a transaction
pub const MAX_OPERATIONS_PER_TRANSACTION: u32 = 1_000;
/// Maximal distance between head time and transaction expiration
pub const MAX_TIME_UNTIL_EXPIRATION: SigmaTime = SigmaTime::from_secs(60 * 60);

/// Blocks between two transaction fee refreshes (one day)
pub const REFRESH_TRANSACTION_FEE_CYCLE: u32 = 28_800;
/// Transaction fee at genesis
pub const INITIAL_TRANSACTION_FEE: Amount = Amount::from_mantissa_scale(1, 2);
/// Fee charged for decentralized application payloads
pub const DAPP_TRANSACTION_FEE: Amount = Amount::from_mantissa_scale(1, 2);
/// Lowest fee producers can vote for
pub const MIN_TRANSACTION_FEE: Amount = Amount::zero();
/// Highest fee producers can vote for
pub const MAX_TRANSACTION_FEE: Amount = Amount::from_mantissa_scale(10, 0);
/// Minimal fee to create an account
pub const ACCOUNT_CREATION_FEE: Amount = Amount::from_mantissa_scale(1, 1);

/// Window during which a previous owner authority can be used to recover an account
pub const OWNER_AUTH_RECOVERY_PERIOD: SigmaTime = SigmaTime::from_days(30);
/// Lifetime of an account recovery request
pub const ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD: SigmaTime = SigmaTime::from_days(1);
/// Minimal time between two owner authority changes
pub const OWNER_UPDATE_LIMIT: SigmaTime = SigmaTime::from_secs(60 * 60);
/// Delay before declining voting rights takes effect
pub const DECLINE_VOTING_RIGHTS_DURATION: SigmaTime = SigmaTime::from_days(30);
/// Inactivity required before a reset account can replace the owner authority
pub const RESET_ACCOUNT_DELAY: SigmaTime = SigmaTime::from_days(30);

/// Escrow time of a savings transfer
pub const SAVINGS_WITHDRAW_TIME: SigmaTime = SigmaTime::from_days(3);
/// Maximal number of pending savings transfers per account
pub const SAVINGS_WITHDRAW_REQUEST_LIMIT: u16 = 100;
/// Length of a staking month
pub const STAKING_MONTH: SigmaTime = SigmaTime::from_days(30);
/// Longest staking period in months
pub const MAX_STAKING_MONTHS: u8 = 12;
/// Maximal number of pending staking requests per account
pub const STAKING_REQUEST_LIMIT: u16 = 100;

/// Reward paid by a mining operation
pub const MINING_REWARD: Amount = Amount::from_mantissa_scale(1, 0);
/// Minimal time between two mining operations of an account
pub const MINING_INTERVAL: SigmaTime = SigmaTime::from_secs(60 * 60);
/// Share of the mining reward (basis points) paid to the block producer
pub const MINING_PRODUCER_SHARE: u32 = 1_000;

/// Maximal memo length
pub const MAX_MEMO_SIZE: u32 = 2048;
/// Maximal url length of a bobserver
pub const MAX_URL_LENGTH: u32 = 2048;
/// Maximal length of account json metadata
pub const MAX_JSON_METADATA_SIZE: u32 = 8192;
/// Maximal length of the id of a custom payload
pub const MAX_CUSTOM_ID_LENGTH: u32 = 32;
/// Maximal size of a custom payload
pub const MAX_CUSTOM_DATA_SIZE: u32 = 8192;
/// Maximal length of a staking fund name
pub const MAX_FUND_NAME_LENGTH: u32 = 32;
/// Maximal length of a swap target address
pub const MAX_SWAP_TARGET_LENGTH: u32 = 128;
/// Maximal number of required authorities of a custom payload
pub const MAX_REQUIRED_AUTHS: u32 = 10;

/// Initial supply, credited to the root account at genesis
pub const INIT_SUPPLY: Amount = Amount::from_mantissa_scale(1_000_000_000, 0);
/// Time of the genesis state, 2023-01-01T00:00:00Z
pub const GENESIS_TIME: SigmaTime = SigmaTime::from_millis(1_672_531_200_000);
/// Name of the staking fund created at genesis
pub const GENESIS_FUND_NAME: &str = "staking";

lazy_static! {
    /// Chain administrator account
    pub static ref ROOT_ACCOUNT: AccountName = AccountName::from_str("sigmaengine").unwrap();
    /// Pool paying mining rewards
    pub static ref MINING_REWARD_ACCOUNT: AccountName = AccountName::from_str("sgt.reward").unwrap();
    /// Account receiving swapped funds
    pub static ref SWAP_ACCOUNT: AccountName = AccountName::from_str("sgt.swap").unwrap();
    /// Key of the root account at genesis
    pub static ref ROOT_PUBLIC_KEY: PublicKey =
        PublicKey::from_str("SGT6LLegbAgLAy28EHrffBVuANFWcFgmqRMW13wBmTExqFE9SCkg4").unwrap();
}
