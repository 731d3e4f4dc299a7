// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::context::EvaluationContext;
use crate::evaluators::{
    account, admin, bobserver, custom, mining, recovery, savings, staking, supply, transfer,
};
use sigma_chain_exports::ChainError;
use sigma_models::Operation;

/// Evaluates a signer operation.
///
/// The match is exhaustive: adding an operation kind does not compile until
/// it is routed here. Virtual operations are produced by the chain only.
pub(crate) fn evaluate(ctx: &mut EvaluationContext<'_>, op: &Operation) -> Result<(), ChainError> {
    match op {
        Operation::AccountCreate(op) => account::account_create(ctx, op),
        Operation::AccountUpdate(op) => account::account_update(ctx, op),
        Operation::AccountAuth(op) => account::account_auth(ctx, op),
        Operation::Transfer(op) => transfer::transfer(ctx, op),
        Operation::BobserverUpdate(op) => bobserver::bobserver_update(ctx, op),
        Operation::UpdateBproducer(op) => bobserver::update_bproducer(ctx, op),
        Operation::ExceptBobserver(op) => bobserver::except_bobserver(ctx, op),
        Operation::VoteTransactionFee(op) => bobserver::vote_transaction_fee(ctx, op),
        Operation::Custom(op) => custom::custom(ctx, op),
        Operation::CustomJson(op) => custom::custom_json(ctx, op),
        Operation::CustomJsonDapp(op) => custom::custom_json_dapp(ctx, op),
        Operation::CustomBinary(op) => custom::custom_binary(ctx, op),
        Operation::RequestAccountRecovery(op) => recovery::request_account_recovery(ctx, op),
        Operation::RecoverAccount(op) => recovery::recover_account(ctx, op),
        Operation::ChangeRecoveryAccount(op) => recovery::change_recovery_account(ctx, op),
        Operation::DeclineVotingRights(op) => recovery::decline_voting_rights(ctx, op),
        Operation::ResetAccount(op) => recovery::reset_account(ctx, op),
        Operation::SetResetAccount(op) => recovery::set_reset_account(ctx, op),
        Operation::Print(op) => supply::print(ctx, op),
        Operation::Burn(op) => supply::burn(ctx, op),
        Operation::RootBurn(op) => supply::root_burn(ctx, op),
        Operation::TransferSavings(op) => savings::transfer_savings(ctx, op),
        Operation::CancelTransferSavings(op) => savings::cancel_transfer_savings(ctx, op),
        Operation::ConclusionTransferSavings(op) => savings::conclusion_transfer_savings(ctx, op),
        Operation::StakingFund(op) => staking::staking_fund(ctx, op),
        Operation::ConclusionStaking(op) => staking::conclusion_staking(ctx, op),
        Operation::TransferFund(op) => staking::transfer_fund(ctx, op),
        Operation::SetFundInterest(op) => staking::set_fund_interest(ctx, op),
        Operation::ReturnStakingFund(op) => staking::return_staking_fund(ctx, op),
        Operation::Mining(op) => mining::mining(ctx, op),
        Operation::SetMiningAccount(op) => mining::set_mining_account(ctx, op),
        Operation::TransferMiningReward(op) => mining::transfer_mining_reward(ctx, op),
        Operation::SetBlacklistAccount(op) => admin::set_blacklist_account(ctx, op),
        Operation::SetSwapAccount(op) => admin::set_swap_account(ctx, op),
        Operation::Swap(op) => admin::swap(ctx, op),
        Operation::FillTransferSavings(_)
        | Operation::FillStakingFund(_)
        | Operation::FillMiningReward(_)
        | Operation::FillProducerMiningReward(_)
        | Operation::FillChangeRecoveryAccount(_) => Err(ChainError::InvalidOperation(format!(
            "virtual operation {} cannot be evaluated",
            op.name()
        ))),
    }
}
