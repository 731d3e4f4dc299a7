// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::account::{AccountName, PublicKey};
use crate::amount::Amount;
use crate::authority::{Authority, AuthorityLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Creates an account funded by its creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    pub fee: Amount,
    pub creator: AccountName,
    pub new_account_name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: PublicKey,
    pub json_metadata: String,
}

/// Replaces the authorities and metadata of an account.
/// Changing the owner authority needs the owner level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: AccountName,
    pub owner: Option<Authority>,
    pub active: Option<Authority>,
    pub posting: Option<Authority>,
    pub memo_key: PublicKey,
    pub json_metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Amount,
    pub memo: String,
}

/// Registers or updates a block producer candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BobserverUpdateOperation {
    pub owner: AccountName,
    pub url: String,
    pub block_signing_key: PublicKey,
    /// proposal for the network maximum block size
    pub maximum_block_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOperation {
    pub required_auths: BTreeSet<AccountName>,
    pub id: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    pub required_auths: BTreeSet<AccountName>,
    pub required_posting_auths: BTreeSet<AccountName>,
    pub id: String,
    pub json: String,
}

/// Json payload addressed to a decentralized application, charged with the dapp fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJsonDappOperation {
    pub required_owner_auths: BTreeSet<AccountName>,
    pub required_active_auths: BTreeSet<AccountName>,
    pub required_posting_auths: BTreeSet<AccountName>,
    pub id: String,
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomBinaryOperation {
    pub required_owner_auths: BTreeSet<AccountName>,
    pub required_active_auths: BTreeSet<AccountName>,
    pub required_posting_auths: BTreeSet<AccountName>,
    pub id: String,
    pub data: Vec<u8>,
}

/// Opened by the recovery partner of an account. A zero weight threshold
/// cancels a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAccountRecoveryOperation {
    pub recovery_account: AccountName,
    pub account_to_recover: AccountName,
    pub new_owner_authority: Authority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverAccountOperation {
    pub account_to_recover: AccountName,
    pub new_owner_authority: Authority,
    pub recent_owner_authority: Authority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecoveryAccountOperation {
    pub account_to_recover: AccountName,
    pub new_recovery_account: AccountName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineVotingRightsOperation {
    pub account: AccountName,
    /// false cancels a pending request
    pub decline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetAccountOperation {
    pub reset_account: AccountName,
    pub account_to_reset: AccountName,
    pub new_owner_authority: Authority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResetAccountOperation {
    pub account: AccountName,
    pub current_reset_account: Option<AccountName>,
    pub reset_account: Option<AccountName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBproducerOperation {
    pub bobserver: AccountName,
    pub approve: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptBobserverOperation {
    pub bobserver: AccountName,
}

/// Adds (or with a zero weight removes) an account member of the active or posting authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAuthOperation {
    pub account: AccountName,
    pub auth_account: AccountName,
    pub level: AuthorityLevel,
    pub weight: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOperation {
    pub account: AccountName,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnOperation {
    pub account: AccountName,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSavingsOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub request_id: u32,
    pub amount: Amount,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTransferSavingsOperation {
    pub from: AccountName,
    pub request_id: u32,
}

/// Claimed by the recipient once the escrow period is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionTransferSavingsOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub request_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingFundOperation {
    pub from: AccountName,
    pub fund_name: String,
    pub request_id: u32,
    pub amount: Amount,
    pub memo: String,
    /// staking period in months
    pub month: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConclusionStakingOperation {
    pub from: AccountName,
    pub fund_name: String,
    pub request_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFundOperation {
    pub from: AccountName,
    pub fund_name: String,
    pub amount: Amount,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFundInterestOperation {
    pub fund_name: String,
    pub month: u8,
    /// basis points paid for the whole period
    pub percent_interest: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnStakingFundOperation {
    pub from: AccountName,
    pub fund_name: String,
    pub request_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTransactionFeeOperation {
    pub voter: AccountName,
    pub fee: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMiningAccountOperation {
    pub account: AccountName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMiningRewardOperation {
    pub to: AccountName,
    pub amount: Amount,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBlacklistAccountOperation {
    pub account: AccountName,
    pub blacklisted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningOperation {
    pub account: AccountName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSwapAccountOperation {
    pub account: AccountName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOperation {
    pub account: AccountName,
    pub amount: Amount,
    /// destination address on the other network
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootBurnOperation {
    pub account: AccountName,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillTransferSavingsOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub request_id: u32,
    pub amount: Amount,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillStakingFundOperation {
    pub from: AccountName,
    pub fund_name: String,
    pub request_id: u32,
    pub amount: Amount,
    pub interest: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillMiningRewardOperation {
    pub account: AccountName,
    pub reward: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillProducerMiningRewardOperation {
    pub producer: AccountName,
    pub reward: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillChangeRecoveryAccountOperation {
    pub account: AccountName,
    pub old_recovery_account: AccountName,
    pub new_recovery_account: AccountName,
}
