// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

//! Every state change of the chain is one of the variants of [`Operation`].
//! The set is closed: adding a kind means adding a variant, and the compiler
//! then points at every exhaustive match that must handle it.

#[allow(missing_docs)]
mod payloads;
mod serialization;

pub use payloads::*;
pub use serialization::{OperationDeserializer, OperationSerializer};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

/// Binary tag of each operation kind
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum OperationTypeId {
    AccountCreate = 0,
    AccountUpdate = 1,
    Transfer = 2,
    BobserverUpdate = 3,
    Custom = 4,
    CustomJson = 5,
    CustomJsonDapp = 6,
    CustomBinary = 7,
    RequestAccountRecovery = 8,
    RecoverAccount = 9,
    ChangeRecoveryAccount = 10,
    DeclineVotingRights = 11,
    ResetAccount = 12,
    SetResetAccount = 13,
    UpdateBproducer = 14,
    ExceptBobserver = 15,
    AccountAuth = 16,
    Print = 17,
    Burn = 18,
    TransferSavings = 19,
    CancelTransferSavings = 20,
    ConclusionTransferSavings = 21,
    StakingFund = 22,
    ConclusionStaking = 23,
    TransferFund = 24,
    SetFundInterest = 25,
    ReturnStakingFund = 26,
    VoteTransactionFee = 27,
    SetMiningAccount = 28,
    TransferMiningReward = 29,
    SetBlacklistAccount = 30,
    Mining = 31,
    SetSwapAccount = 32,
    Swap = 33,
    RootBurn = 34,
    FillTransferSavings = 35,
    FillStakingFund = 36,
    FillMiningReward = 37,
    FillProducerMiningReward = 38,
    FillChangeRecoveryAccount = 39,
}

/// Tagged union of every operation kind, signer-authored and virtual
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    AccountCreate(AccountCreateOperation),
    AccountUpdate(AccountUpdateOperation),
    Transfer(TransferOperation),
    BobserverUpdate(BobserverUpdateOperation),
    Custom(CustomOperation),
    CustomJson(CustomJsonOperation),
    CustomJsonDapp(CustomJsonDappOperation),
    CustomBinary(CustomBinaryOperation),
    RequestAccountRecovery(RequestAccountRecoveryOperation),
    RecoverAccount(RecoverAccountOperation),
    ChangeRecoveryAccount(ChangeRecoveryAccountOperation),
    DeclineVotingRights(DeclineVotingRightsOperation),
    ResetAccount(ResetAccountOperation),
    SetResetAccount(SetResetAccountOperation),
    UpdateBproducer(UpdateBproducerOperation),
    ExceptBobserver(ExceptBobserverOperation),
    AccountAuth(AccountAuthOperation),
    Print(PrintOperation),
    Burn(BurnOperation),
    TransferSavings(TransferSavingsOperation),
    CancelTransferSavings(CancelTransferSavingsOperation),
    ConclusionTransferSavings(ConclusionTransferSavingsOperation),
    StakingFund(StakingFundOperation),
    ConclusionStaking(ConclusionStakingOperation),
    TransferFund(TransferFundOperation),
    SetFundInterest(SetFundInterestOperation),
    ReturnStakingFund(ReturnStakingFundOperation),
    VoteTransactionFee(VoteTransactionFeeOperation),
    SetMiningAccount(SetMiningAccountOperation),
    TransferMiningReward(TransferMiningRewardOperation),
    SetBlacklistAccount(SetBlacklistAccountOperation),
    Mining(MiningOperation),
    SetSwapAccount(SetSwapAccountOperation),
    Swap(SwapOperation),
    RootBurn(RootBurnOperation),
    FillTransferSavings(FillTransferSavingsOperation),
    FillStakingFund(FillStakingFundOperation),
    FillMiningReward(FillMiningRewardOperation),
    FillProducerMiningReward(FillProducerMiningRewardOperation),
    FillChangeRecoveryAccount(FillChangeRecoveryAccountOperation),
}

impl Operation {
    /// snake case name of the kind, e.g. `transfer_savings`
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Virtual operations are emitted by the chain itself and are never
    /// accepted from a signer
    pub fn is_virtual(&self) -> bool {
        matches!(
            self,
            Operation::FillTransferSavings(_)
                | Operation::FillStakingFund(_)
                | Operation::FillMiningReward(_)
                | Operation::FillProducerMiningReward(_)
                | Operation::FillChangeRecoveryAccount(_)
        )
    }

    /// Binary tag of the operation
    pub fn operation_type_id(&self) -> OperationTypeId {
        match self {
            Operation::AccountCreate(_) => OperationTypeId::AccountCreate,
            Operation::AccountUpdate(_) => OperationTypeId::AccountUpdate,
            Operation::Transfer(_) => OperationTypeId::Transfer,
            Operation::BobserverUpdate(_) => OperationTypeId::BobserverUpdate,
            Operation::Custom(_) => OperationTypeId::Custom,
            Operation::CustomJson(_) => OperationTypeId::CustomJson,
            Operation::CustomJsonDapp(_) => OperationTypeId::CustomJsonDapp,
            Operation::CustomBinary(_) => OperationTypeId::CustomBinary,
            Operation::RequestAccountRecovery(_) => OperationTypeId::RequestAccountRecovery,
            Operation::RecoverAccount(_) => OperationTypeId::RecoverAccount,
            Operation::ChangeRecoveryAccount(_) => OperationTypeId::ChangeRecoveryAccount,
            Operation::DeclineVotingRights(_) => OperationTypeId::DeclineVotingRights,
            Operation::ResetAccount(_) => OperationTypeId::ResetAccount,
            Operation::SetResetAccount(_) => OperationTypeId::SetResetAccount,
            Operation::UpdateBproducer(_) => OperationTypeId::UpdateBproducer,
            Operation::ExceptBobserver(_) => OperationTypeId::ExceptBobserver,
            Operation::AccountAuth(_) => OperationTypeId::AccountAuth,
            Operation::Print(_) => OperationTypeId::Print,
            Operation::Burn(_) => OperationTypeId::Burn,
            Operation::TransferSavings(_) => OperationTypeId::TransferSavings,
            Operation::CancelTransferSavings(_) => OperationTypeId::CancelTransferSavings,
            Operation::ConclusionTransferSavings(_) => OperationTypeId::ConclusionTransferSavings,
            Operation::StakingFund(_) => OperationTypeId::StakingFund,
            Operation::ConclusionStaking(_) => OperationTypeId::ConclusionStaking,
            Operation::TransferFund(_) => OperationTypeId::TransferFund,
            Operation::SetFundInterest(_) => OperationTypeId::SetFundInterest,
            Operation::ReturnStakingFund(_) => OperationTypeId::ReturnStakingFund,
            Operation::VoteTransactionFee(_) => OperationTypeId::VoteTransactionFee,
            Operation::SetMiningAccount(_) => OperationTypeId::SetMiningAccount,
            Operation::TransferMiningReward(_) => OperationTypeId::TransferMiningReward,
            Operation::SetBlacklistAccount(_) => OperationTypeId::SetBlacklistAccount,
            Operation::Mining(_) => OperationTypeId::Mining,
            Operation::SetSwapAccount(_) => OperationTypeId::SetSwapAccount,
            Operation::Swap(_) => OperationTypeId::Swap,
            Operation::RootBurn(_) => OperationTypeId::RootBurn,
            Operation::FillTransferSavings(_) => OperationTypeId::FillTransferSavings,
            Operation::FillStakingFund(_) => OperationTypeId::FillStakingFund,
            Operation::FillMiningReward(_) => OperationTypeId::FillMiningReward,
            Operation::FillProducerMiningReward(_) => OperationTypeId::FillProducerMiningReward,
            Operation::FillChangeRecoveryAccount(_) => OperationTypeId::FillChangeRecoveryAccount,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
