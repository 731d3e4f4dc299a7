// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use super::payloads::*;
use super::{Operation, OperationTypeId};
use crate::account::{
    AccountName, AccountNameDeserializer, AccountNameSerializer, PublicKey,
    PublicKeyDeserializer, PublicKeySerializer,
};
use crate::amount::{Amount, AmountDeserializer, AmountSerializer};
use crate::authority::{Authority, AuthorityDeserializer, AuthorityLevel, AuthoritySerializer};
use crate::config::constants::{
    MAX_CUSTOM_DATA_SIZE, MAX_CUSTOM_ID_LENGTH, MAX_FUND_NAME_LENGTH, MAX_JSON_METADATA_SIZE,
    MAX_MEMO_SIZE, MAX_REQUIRED_AUTHS, MAX_SWAP_TARGET_LENGTH, MAX_URL_LENGTH,
};
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use sigma_serialization::{
    BytesDeserializer, BytesSerializer, Deserializer, SerializeError, Serializer,
    StringDeserializer, StringSerializer, U16VarIntDeserializer, U16VarIntSerializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use std::collections::BTreeSet;
use std::ops::Bound::Included;

/// Serializer for `Operation`: the type tag followed by the payload fields
#[derive(Clone, Default)]
pub struct OperationSerializer {
    u16_serializer: U16VarIntSerializer,
    u32_serializer: U32VarIntSerializer,
    amount_serializer: AmountSerializer,
    account_name_serializer: AccountNameSerializer,
    public_key_serializer: PublicKeySerializer,
    authority_serializer: AuthoritySerializer,
    string_serializer: StringSerializer,
    bytes_serializer: BytesSerializer,
}

impl OperationSerializer {
    /// Creates an `OperationSerializer`
    pub const fn new() -> Self {
        Self {
            u16_serializer: U16VarIntSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            amount_serializer: AmountSerializer::new(),
            account_name_serializer: AccountNameSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
            authority_serializer: AuthoritySerializer::new(),
            string_serializer: StringSerializer::new(),
            bytes_serializer: BytesSerializer::new(),
        }
    }

    fn name(&self, value: &AccountName, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.account_name_serializer.serialize(value, buffer)
    }

    fn names(
        &self,
        value: &BTreeSet<AccountName>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u32 = value
            .len()
            .try_into()
            .map_err(|_| SerializeError::NumberTooBig(format!("{} accounts", value.len())))?;
        self.u32_serializer.serialize(&count, buffer)?;
        for name in value {
            self.name(name, buffer)?;
        }
        Ok(())
    }

    fn boolean(&self, value: bool, buffer: &mut Vec<u8>) {
        buffer.push(u8::from(value));
    }

    fn optional_name(
        &self,
        value: &Option<AccountName>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.boolean(value.is_some(), buffer);
        match value {
            Some(name) => self.name(name, buffer),
            None => Ok(()),
        }
    }

    fn optional_authority(
        &self,
        value: &Option<Authority>,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.boolean(value.is_some(), buffer);
        match value {
            Some(authority) => self.authority_serializer.serialize(authority, buffer),
            None => Ok(()),
        }
    }

    fn amount(&self, value: &Amount, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.amount_serializer.serialize(value, buffer)
    }

    fn authority(&self, value: &Authority, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.authority_serializer.serialize(value, buffer)
    }

    fn key(&self, value: &PublicKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.public_key_serializer.serialize(value, buffer)
    }

    fn string(&self, value: &String, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.string_serializer.serialize(value, buffer)
    }

    fn u32(&self, value: u32, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer.serialize(&value, buffer)
    }
}

impl Serializer<Operation> for OperationSerializer {
    fn serialize(&self, value: &Operation, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32(u32::from(value.operation_type_id()), buffer)?;
        match value {
            Operation::AccountCreate(op) => {
                self.amount(&op.fee, buffer)?;
                self.name(&op.creator, buffer)?;
                self.name(&op.new_account_name, buffer)?;
                self.authority(&op.owner, buffer)?;
                self.authority(&op.active, buffer)?;
                self.authority(&op.posting, buffer)?;
                self.key(&op.memo_key, buffer)?;
                self.string(&op.json_metadata, buffer)
            }
            Operation::AccountUpdate(op) => {
                self.name(&op.account, buffer)?;
                self.optional_authority(&op.owner, buffer)?;
                self.optional_authority(&op.active, buffer)?;
                self.optional_authority(&op.posting, buffer)?;
                self.key(&op.memo_key, buffer)?;
                self.string(&op.json_metadata, buffer)
            }
            Operation::Transfer(op) => {
                self.name(&op.from, buffer)?;
                self.name(&op.to, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)
            }
            Operation::BobserverUpdate(op) => {
                self.name(&op.owner, buffer)?;
                self.string(&op.url, buffer)?;
                self.key(&op.block_signing_key, buffer)?;
                self.u32(op.maximum_block_size, buffer)
            }
            Operation::Custom(op) => {
                self.names(&op.required_auths, buffer)?;
                self.u16_serializer.serialize(&op.id, buffer)?;
                self.bytes_serializer.serialize(&op.data, buffer)
            }
            Operation::CustomJson(op) => {
                self.names(&op.required_auths, buffer)?;
                self.names(&op.required_posting_auths, buffer)?;
                self.string(&op.id, buffer)?;
                self.string(&op.json, buffer)
            }
            Operation::CustomJsonDapp(op) => {
                self.names(&op.required_owner_auths, buffer)?;
                self.names(&op.required_active_auths, buffer)?;
                self.names(&op.required_posting_auths, buffer)?;
                self.string(&op.id, buffer)?;
                self.string(&op.json, buffer)
            }
            Operation::CustomBinary(op) => {
                self.names(&op.required_owner_auths, buffer)?;
                self.names(&op.required_active_auths, buffer)?;
                self.names(&op.required_posting_auths, buffer)?;
                self.string(&op.id, buffer)?;
                self.bytes_serializer.serialize(&op.data, buffer)
            }
            Operation::RequestAccountRecovery(op) => {
                self.name(&op.recovery_account, buffer)?;
                self.name(&op.account_to_recover, buffer)?;
                self.authority(&op.new_owner_authority, buffer)
            }
            Operation::RecoverAccount(op) => {
                self.name(&op.account_to_recover, buffer)?;
                self.authority(&op.new_owner_authority, buffer)?;
                self.authority(&op.recent_owner_authority, buffer)
            }
            Operation::ChangeRecoveryAccount(op) => {
                self.name(&op.account_to_recover, buffer)?;
                self.name(&op.new_recovery_account, buffer)
            }
            Operation::DeclineVotingRights(op) => {
                self.name(&op.account, buffer)?;
                self.boolean(op.decline, buffer);
                Ok(())
            }
            Operation::ResetAccount(op) => {
                self.name(&op.reset_account, buffer)?;
                self.name(&op.account_to_reset, buffer)?;
                self.authority(&op.new_owner_authority, buffer)
            }
            Operation::SetResetAccount(op) => {
                self.name(&op.account, buffer)?;
                self.optional_name(&op.current_reset_account, buffer)?;
                self.optional_name(&op.reset_account, buffer)
            }
            Operation::UpdateBproducer(op) => {
                self.name(&op.bobserver, buffer)?;
                self.boolean(op.approve, buffer);
                Ok(())
            }
            Operation::ExceptBobserver(op) => self.name(&op.bobserver, buffer),
            Operation::AccountAuth(op) => {
                self.name(&op.account, buffer)?;
                self.name(&op.auth_account, buffer)?;
                buffer.push(u8::from(op.level));
                self.u16_serializer.serialize(&op.weight, buffer)
            }
            Operation::Print(op) => {
                self.name(&op.account, buffer)?;
                self.amount(&op.amount, buffer)
            }
            Operation::Burn(op) => {
                self.name(&op.account, buffer)?;
                self.amount(&op.amount, buffer)
            }
            Operation::TransferSavings(op) => {
                self.name(&op.from, buffer)?;
                self.name(&op.to, buffer)?;
                self.u32(op.request_id, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)
            }
            Operation::CancelTransferSavings(op) => {
                self.name(&op.from, buffer)?;
                self.u32(op.request_id, buffer)
            }
            Operation::ConclusionTransferSavings(op) => {
                self.name(&op.from, buffer)?;
                self.name(&op.to, buffer)?;
                self.u32(op.request_id, buffer)
            }
            Operation::StakingFund(op) => {
                self.name(&op.from, buffer)?;
                self.string(&op.fund_name, buffer)?;
                self.u32(op.request_id, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)?;
                buffer.push(op.month);
                Ok(())
            }
            Operation::ConclusionStaking(op) => {
                self.name(&op.from, buffer)?;
                self.string(&op.fund_name, buffer)?;
                self.u32(op.request_id, buffer)
            }
            Operation::TransferFund(op) => {
                self.name(&op.from, buffer)?;
                self.string(&op.fund_name, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)
            }
            Operation::SetFundInterest(op) => {
                self.string(&op.fund_name, buffer)?;
                buffer.push(op.month);
                self.u16_serializer.serialize(&op.percent_interest, buffer)
            }
            Operation::ReturnStakingFund(op) => {
                self.name(&op.from, buffer)?;
                self.string(&op.fund_name, buffer)?;
                self.u32(op.request_id, buffer)
            }
            Operation::VoteTransactionFee(op) => {
                self.name(&op.voter, buffer)?;
                self.amount(&op.fee, buffer)
            }
            Operation::SetMiningAccount(op) => self.name(&op.account, buffer),
            Operation::TransferMiningReward(op) => {
                self.name(&op.to, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)
            }
            Operation::SetBlacklistAccount(op) => {
                self.name(&op.account, buffer)?;
                self.boolean(op.blacklisted, buffer);
                Ok(())
            }
            Operation::Mining(op) => self.name(&op.account, buffer),
            Operation::SetSwapAccount(op) => self.name(&op.account, buffer),
            Operation::Swap(op) => {
                self.name(&op.account, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.target, buffer)
            }
            Operation::RootBurn(op) => {
                self.name(&op.account, buffer)?;
                self.amount(&op.amount, buffer)
            }
            Operation::FillTransferSavings(op) => {
                self.name(&op.from, buffer)?;
                self.name(&op.to, buffer)?;
                self.u32(op.request_id, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.string(&op.memo, buffer)
            }
            Operation::FillStakingFund(op) => {
                self.name(&op.from, buffer)?;
                self.string(&op.fund_name, buffer)?;
                self.u32(op.request_id, buffer)?;
                self.amount(&op.amount, buffer)?;
                self.amount(&op.interest, buffer)
            }
            Operation::FillMiningReward(op) => {
                self.name(&op.account, buffer)?;
                self.amount(&op.reward, buffer)
            }
            Operation::FillProducerMiningReward(op) => {
                self.name(&op.producer, buffer)?;
                self.amount(&op.reward, buffer)
            }
            Operation::FillChangeRecoveryAccount(op) => {
                self.name(&op.account, buffer)?;
                self.name(&op.old_recovery_account, buffer)?;
                self.name(&op.new_recovery_account, buffer)
            }
        }
    }
}

/// Deserializer for `Operation`
#[derive(Clone)]
pub struct OperationDeserializer {
    type_id_deserializer: U32VarIntDeserializer,
    u16_deserializer: U16VarIntDeserializer,
    u32_deserializer: U32VarIntDeserializer,
    auth_count_deserializer: U32VarIntDeserializer,
    amount_deserializer: AmountDeserializer,
    account_name_deserializer: AccountNameDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    authority_deserializer: AuthorityDeserializer,
    memo_deserializer: StringDeserializer,
    json_metadata_deserializer: StringDeserializer,
    url_deserializer: StringDeserializer,
    custom_id_deserializer: StringDeserializer,
    json_deserializer: StringDeserializer,
    fund_name_deserializer: StringDeserializer,
    swap_target_deserializer: StringDeserializer,
    data_deserializer: BytesDeserializer,
}

impl OperationDeserializer {
    /// Creates an `OperationDeserializer`
    pub const fn new() -> Self {
        Self {
            type_id_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(OperationTypeId::FillChangeRecoveryAccount as u32),
            ),
            u16_deserializer: U16VarIntDeserializer::new(Included(0), Included(u16::MAX)),
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            auth_count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_REQUIRED_AUTHS),
            ),
            amount_deserializer: AmountDeserializer::new(),
            account_name_deserializer: AccountNameDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
            authority_deserializer: AuthorityDeserializer::new(),
            memo_deserializer: StringDeserializer::new(MAX_MEMO_SIZE),
            json_metadata_deserializer: StringDeserializer::new(MAX_JSON_METADATA_SIZE),
            url_deserializer: StringDeserializer::new(MAX_URL_LENGTH),
            custom_id_deserializer: StringDeserializer::new(MAX_CUSTOM_ID_LENGTH),
            json_deserializer: StringDeserializer::new(MAX_CUSTOM_DATA_SIZE),
            fund_name_deserializer: StringDeserializer::new(MAX_FUND_NAME_LENGTH),
            swap_target_deserializer: StringDeserializer::new(MAX_SWAP_TARGET_LENGTH),
            data_deserializer: BytesDeserializer::new(MAX_CUSTOM_DATA_SIZE),
        }
    }

    fn name<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], AccountName, E> {
        self.account_name_deserializer.deserialize(input)
    }

    fn names<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], BTreeSet<AccountName>, E> {
        length_count(
            |input| self.auth_count_deserializer.deserialize(input),
            |input| self.name(input),
        )
        .map(|names: Vec<AccountName>| names.into_iter().collect())
        .parse(input)
    }

    fn boolean<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], bool, E> {
        let (rest, byte) = nom::number::complete::u8::<&'a [u8], E>(input)?;
        match byte {
            0 => Ok((rest, false)),
            1 => Ok((rest, true)),
            _ => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify))),
        }
    }

    fn byte<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], u8, E> {
        nom::number::complete::u8(input)
    }

    fn level<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], AuthorityLevel, E> {
        let (rest, byte) = self.byte::<E>(input)?;
        let level = AuthorityLevel::try_from(byte)
            .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
        Ok((rest, level))
    }

    fn optional_name<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Option<AccountName>, E> {
        let (rest, present) = self.boolean::<E>(input)?;
        if !present {
            return Ok((rest, None));
        }
        let (rest, name) = self.name::<E>(rest)?;
        Ok((rest, Some(name)))
    }

    fn optional_authority<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Option<Authority>, E> {
        let (rest, present) = self.boolean::<E>(input)?;
        if !present {
            return Ok((rest, None));
        }
        let (rest, authority) = self.authority::<E>(rest)?;
        Ok((rest, Some(authority)))
    }

    fn amount<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Amount, E> {
        self.amount_deserializer.deserialize(input)
    }

    fn authority<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], Authority, E> {
        self.authority_deserializer.deserialize(input)
    }

    fn key<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], PublicKey, E> {
        self.public_key_deserializer.deserialize(input)
    }

    fn u32<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        self.u32_deserializer.deserialize(input)
    }

    fn memo<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        self.memo_deserializer.deserialize(input)
    }

    fn fund_name<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        self.fund_name_deserializer.deserialize(input)
    }

    fn custom_id<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        input: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        self.custom_id_deserializer.deserialize(input)
    }
}

impl Default for OperationDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Operation> for OperationDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Operation, E> {
        context("Failed Operation deserialization", |buffer: &'a [u8]| {
            let (input, id) = self.type_id_deserializer.deserialize::<E>(buffer)?;
            let id = OperationTypeId::try_from(id).map_err(|_| {
                nom::Err::Error(E::from_error_kind(buffer, nom::error::ErrorKind::Eof))
            })?;
            match id {
                OperationTypeId::AccountCreate => context(
                    "Failed AccountCreate deserialization",
                    tuple((
                        |input| self.amount(input),
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.authority(input),
                        |input| self.authority(input),
                        |input| self.authority(input),
                        |input| self.key(input),
                        |input| self.json_metadata_deserializer.deserialize(input),
                    )),
                )
                .map(
                    |(fee, creator, new_account_name, owner, active, posting, memo_key, json_metadata)| {
                        Operation::AccountCreate(AccountCreateOperation {
                            fee,
                            creator,
                            new_account_name,
                            owner,
                            active,
                            posting,
                            memo_key,
                            json_metadata,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::AccountUpdate => context(
                    "Failed AccountUpdate deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.optional_authority(input),
                        |input| self.optional_authority(input),
                        |input| self.optional_authority(input),
                        |input| self.key(input),
                        |input| self.json_metadata_deserializer.deserialize(input),
                    )),
                )
                .map(|(account, owner, active, posting, memo_key, json_metadata)| {
                    Operation::AccountUpdate(AccountUpdateOperation {
                        account,
                        owner,
                        active,
                        posting,
                        memo_key,
                        json_metadata,
                    })
                })
                .parse(input),
                OperationTypeId::Transfer => context(
                    "Failed Transfer deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                    )),
                )
                .map(|(from, to, amount, memo)| {
                    Operation::Transfer(TransferOperation {
                        from,
                        to,
                        amount,
                        memo,
                    })
                })
                .parse(input),
                OperationTypeId::BobserverUpdate => context(
                    "Failed BobserverUpdate deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.url_deserializer.deserialize(input),
                        |input| self.key(input),
                        |input| self.u32(input),
                    )),
                )
                .map(|(owner, url, block_signing_key, maximum_block_size)| {
                    Operation::BobserverUpdate(BobserverUpdateOperation {
                        owner,
                        url,
                        block_signing_key,
                        maximum_block_size,
                    })
                })
                .parse(input),
                OperationTypeId::Custom => context(
                    "Failed Custom deserialization",
                    tuple((
                        |input| self.names(input),
                        |input| self.u16_deserializer.deserialize(input),
                        |input| self.data_deserializer.deserialize(input),
                    )),
                )
                .map(|(required_auths, id, data)| {
                    Operation::Custom(CustomOperation {
                        required_auths,
                        id,
                        data,
                    })
                })
                .parse(input),
                OperationTypeId::CustomJson => context(
                    "Failed CustomJson deserialization",
                    tuple((
                        |input| self.names(input),
                        |input| self.names(input),
                        |input| self.custom_id(input),
                        |input| self.json_deserializer.deserialize(input),
                    )),
                )
                .map(|(required_auths, required_posting_auths, id, json)| {
                    Operation::CustomJson(CustomJsonOperation {
                        required_auths,
                        required_posting_auths,
                        id,
                        json,
                    })
                })
                .parse(input),
                OperationTypeId::CustomJsonDapp => context(
                    "Failed CustomJsonDapp deserialization",
                    tuple((
                        |input| self.names(input),
                        |input| self.names(input),
                        |input| self.names(input),
                        |input| self.custom_id(input),
                        |input| self.json_deserializer.deserialize(input),
                    )),
                )
                .map(
                    |(
                        required_owner_auths,
                        required_active_auths,
                        required_posting_auths,
                        id,
                        json,
                    )| {
                        Operation::CustomJsonDapp(CustomJsonDappOperation {
                            required_owner_auths,
                            required_active_auths,
                            required_posting_auths,
                            id,
                            json,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::CustomBinary => context(
                    "Failed CustomBinary deserialization",
                    tuple((
                        |input| self.names(input),
                        |input| self.names(input),
                        |input| self.names(input),
                        |input| self.custom_id(input),
                        |input| self.data_deserializer.deserialize(input),
                    )),
                )
                .map(
                    |(
                        required_owner_auths,
                        required_active_auths,
                        required_posting_auths,
                        id,
                        data,
                    )| {
                        Operation::CustomBinary(CustomBinaryOperation {
                            required_owner_auths,
                            required_active_auths,
                            required_posting_auths,
                            id,
                            data,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::RequestAccountRecovery => context(
                    "Failed RequestAccountRecovery deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.authority(input),
                    )),
                )
                .map(|(recovery_account, account_to_recover, new_owner_authority)| {
                    Operation::RequestAccountRecovery(RequestAccountRecoveryOperation {
                        recovery_account,
                        account_to_recover,
                        new_owner_authority,
                    })
                })
                .parse(input),
                OperationTypeId::RecoverAccount => context(
                    "Failed RecoverAccount deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.authority(input),
                        |input| self.authority(input),
                    )),
                )
                .map(
                    |(account_to_recover, new_owner_authority, recent_owner_authority)| {
                        Operation::RecoverAccount(RecoverAccountOperation {
                            account_to_recover,
                            new_owner_authority,
                            recent_owner_authority,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::ChangeRecoveryAccount => context(
                    "Failed ChangeRecoveryAccount deserialization",
                    tuple((|input| self.name(input), |input| self.name(input))),
                )
                .map(|(account_to_recover, new_recovery_account)| {
                    Operation::ChangeRecoveryAccount(ChangeRecoveryAccountOperation {
                        account_to_recover,
                        new_recovery_account,
                    })
                })
                .parse(input),
                OperationTypeId::DeclineVotingRights => context(
                    "Failed DeclineVotingRights deserialization",
                    tuple((|input| self.name(input), |input| self.boolean(input))),
                )
                .map(|(account, decline)| {
                    Operation::DeclineVotingRights(DeclineVotingRightsOperation {
                        account,
                        decline,
                    })
                })
                .parse(input),
                OperationTypeId::ResetAccount => context(
                    "Failed ResetAccount deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.authority(input),
                    )),
                )
                .map(|(reset_account, account_to_reset, new_owner_authority)| {
                    Operation::ResetAccount(ResetAccountOperation {
                        reset_account,
                        account_to_reset,
                        new_owner_authority,
                    })
                })
                .parse(input),
                OperationTypeId::SetResetAccount => context(
                    "Failed SetResetAccount deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.optional_name(input),
                        |input| self.optional_name(input),
                    )),
                )
                .map(|(account, current_reset_account, reset_account)| {
                    Operation::SetResetAccount(SetResetAccountOperation {
                        account,
                        current_reset_account,
                        reset_account,
                    })
                })
                .parse(input),
                OperationTypeId::UpdateBproducer => context(
                    "Failed UpdateBproducer deserialization",
                    tuple((|input| self.name(input), |input| self.boolean(input))),
                )
                .map(|(bobserver, approve)| {
                    Operation::UpdateBproducer(UpdateBproducerOperation { bobserver, approve })
                })
                .parse(input),
                OperationTypeId::ExceptBobserver => context(
                    "Failed ExceptBobserver deserialization",
                    |input| self.name(input),
                )
                .map(|bobserver| Operation::ExceptBobserver(ExceptBobserverOperation { bobserver }))
                .parse(input),
                OperationTypeId::AccountAuth => context(
                    "Failed AccountAuth deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.level(input),
                        |input| self.u16_deserializer.deserialize(input),
                    )),
                )
                .map(|(account, auth_account, level, weight)| {
                    Operation::AccountAuth(AccountAuthOperation {
                        account,
                        auth_account,
                        level,
                        weight,
                    })
                })
                .parse(input),
                OperationTypeId::Print => context(
                    "Failed Print deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(account, amount)| Operation::Print(PrintOperation { account, amount }))
                .parse(input),
                OperationTypeId::Burn => context(
                    "Failed Burn deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(account, amount)| Operation::Burn(BurnOperation { account, amount }))
                .parse(input),
                OperationTypeId::TransferSavings => context(
                    "Failed TransferSavings deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.u32(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                    )),
                )
                .map(|(from, to, request_id, amount, memo)| {
                    Operation::TransferSavings(TransferSavingsOperation {
                        from,
                        to,
                        request_id,
                        amount,
                        memo,
                    })
                })
                .parse(input),
                OperationTypeId::CancelTransferSavings => context(
                    "Failed CancelTransferSavings deserialization",
                    tuple((|input| self.name(input), |input| self.u32(input))),
                )
                .map(|(from, request_id)| {
                    Operation::CancelTransferSavings(CancelTransferSavingsOperation {
                        from,
                        request_id,
                    })
                })
                .parse(input),
                OperationTypeId::ConclusionTransferSavings => context(
                    "Failed ConclusionTransferSavings deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.u32(input),
                    )),
                )
                .map(|(from, to, request_id)| {
                    Operation::ConclusionTransferSavings(ConclusionTransferSavingsOperation {
                        from,
                        to,
                        request_id,
                    })
                })
                .parse(input),
                OperationTypeId::StakingFund => context(
                    "Failed StakingFund deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.fund_name(input),
                        |input| self.u32(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                        |input| self.byte(input),
                    )),
                )
                .map(|(from, fund_name, request_id, amount, memo, month)| {
                    Operation::StakingFund(StakingFundOperation {
                        from,
                        fund_name,
                        request_id,
                        amount,
                        memo,
                        month,
                    })
                })
                .parse(input),
                OperationTypeId::ConclusionStaking => context(
                    "Failed ConclusionStaking deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.fund_name(input),
                        |input| self.u32(input),
                    )),
                )
                .map(|(from, fund_name, request_id)| {
                    Operation::ConclusionStaking(ConclusionStakingOperation {
                        from,
                        fund_name,
                        request_id,
                    })
                })
                .parse(input),
                OperationTypeId::TransferFund => context(
                    "Failed TransferFund deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.fund_name(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                    )),
                )
                .map(|(from, fund_name, amount, memo)| {
                    Operation::TransferFund(TransferFundOperation {
                        from,
                        fund_name,
                        amount,
                        memo,
                    })
                })
                .parse(input),
                OperationTypeId::SetFundInterest => context(
                    "Failed SetFundInterest deserialization",
                    tuple((
                        |input| self.fund_name(input),
                        |input| self.byte(input),
                        |input| self.u16_deserializer.deserialize(input),
                    )),
                )
                .map(|(fund_name, month, percent_interest)| {
                    Operation::SetFundInterest(SetFundInterestOperation {
                        fund_name,
                        month,
                        percent_interest,
                    })
                })
                .parse(input),
                OperationTypeId::ReturnStakingFund => context(
                    "Failed ReturnStakingFund deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.fund_name(input),
                        |input| self.u32(input),
                    )),
                )
                .map(|(from, fund_name, request_id)| {
                    Operation::ReturnStakingFund(ReturnStakingFundOperation {
                        from,
                        fund_name,
                        request_id,
                    })
                })
                .parse(input),
                OperationTypeId::VoteTransactionFee => context(
                    "Failed VoteTransactionFee deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(voter, fee)| {
                    Operation::VoteTransactionFee(VoteTransactionFeeOperation { voter, fee })
                })
                .parse(input),
                OperationTypeId::SetMiningAccount => context(
                    "Failed SetMiningAccount deserialization",
                    |input| self.name(input),
                )
                .map(|account| Operation::SetMiningAccount(SetMiningAccountOperation { account }))
                .parse(input),
                OperationTypeId::TransferMiningReward => context(
                    "Failed TransferMiningReward deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                    )),
                )
                .map(|(to, amount, memo)| {
                    Operation::TransferMiningReward(TransferMiningRewardOperation {
                        to,
                        amount,
                        memo,
                    })
                })
                .parse(input),
                OperationTypeId::SetBlacklistAccount => context(
                    "Failed SetBlacklistAccount deserialization",
                    tuple((|input| self.name(input), |input| self.boolean(input))),
                )
                .map(|(account, blacklisted)| {
                    Operation::SetBlacklistAccount(SetBlacklistAccountOperation {
                        account,
                        blacklisted,
                    })
                })
                .parse(input),
                OperationTypeId::Mining => context("Failed Mining deserialization", |input| {
                    self.name(input)
                })
                .map(|account| Operation::Mining(MiningOperation { account }))
                .parse(input),
                OperationTypeId::SetSwapAccount => context(
                    "Failed SetSwapAccount deserialization",
                    |input| self.name(input),
                )
                .map(|account| Operation::SetSwapAccount(SetSwapAccountOperation { account }))
                .parse(input),
                OperationTypeId::Swap => context(
                    "Failed Swap deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.amount(input),
                        |input| self.swap_target_deserializer.deserialize(input),
                    )),
                )
                .map(|(account, amount, target)| {
                    Operation::Swap(SwapOperation {
                        account,
                        amount,
                        target,
                    })
                })
                .parse(input),
                OperationTypeId::RootBurn => context(
                    "Failed RootBurn deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(account, amount)| Operation::RootBurn(RootBurnOperation { account, amount }))
                .parse(input),
                OperationTypeId::FillTransferSavings => context(
                    "Failed FillTransferSavings deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.u32(input),
                        |input| self.amount(input),
                        |input| self.memo(input),
                    )),
                )
                .map(|(from, to, request_id, amount, memo)| {
                    Operation::FillTransferSavings(FillTransferSavingsOperation {
                        from,
                        to,
                        request_id,
                        amount,
                        memo,
                    })
                })
                .parse(input),
                OperationTypeId::FillStakingFund => context(
                    "Failed FillStakingFund deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.fund_name(input),
                        |input| self.u32(input),
                        |input| self.amount(input),
                        |input| self.amount(input),
                    )),
                )
                .map(|(from, fund_name, request_id, amount, interest)| {
                    Operation::FillStakingFund(FillStakingFundOperation {
                        from,
                        fund_name,
                        request_id,
                        amount,
                        interest,
                    })
                })
                .parse(input),
                OperationTypeId::FillMiningReward => context(
                    "Failed FillMiningReward deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(account, reward)| {
                    Operation::FillMiningReward(FillMiningRewardOperation { account, reward })
                })
                .parse(input),
                OperationTypeId::FillProducerMiningReward => context(
                    "Failed FillProducerMiningReward deserialization",
                    tuple((|input| self.name(input), |input| self.amount(input))),
                )
                .map(|(producer, reward)| {
                    Operation::FillProducerMiningReward(FillProducerMiningRewardOperation {
                        producer,
                        reward,
                    })
                })
                .parse(input),
                OperationTypeId::FillChangeRecoveryAccount => context(
                    "Failed FillChangeRecoveryAccount deserialization",
                    tuple((
                        |input| self.name(input),
                        |input| self.name(input),
                        |input| self.name(input),
                    )),
                )
                .map(|(account, old_recovery_account, new_recovery_account)| {
                    Operation::FillChangeRecoveryAccount(FillChangeRecoveryAccountOperation {
                        account,
                        old_recovery_account,
                        new_recovery_account,
                    })
                })
                .parse(input),
            }
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_serialization::DeserializeError;
    use std::str::FromStr;

    fn name(value: &str) -> AccountName {
        AccountName::from_str(value).unwrap()
    }

    fn decode(buffer: &[u8]) -> Operation {
        let (rest, op) = OperationDeserializer::new()
            .deserialize::<DeserializeError>(buffer)
            .unwrap();
        assert!(rest.is_empty());
        op
    }

    #[test]
    fn account_update_keeps_optional_authorities() {
        let op = Operation::AccountUpdate(AccountUpdateOperation {
            account: name("alice"),
            owner: None,
            active: Some(Authority::from_account(name("bob"))),
            posting: None,
            memo_key: PublicKey::from_str("SGT7ZPrxj5P9C3h5t3i1m").unwrap(),
            json_metadata: "{}".to_string(),
        });
        let mut buffer = Vec::new();
        OperationSerializer::new().serialize(&op, &mut buffer).unwrap();
        assert_eq!(buffer[0], OperationTypeId::AccountUpdate as u8);
        assert_eq!(decode(&buffer), op);
    }

    #[test]
    fn custom_json_dapp_keeps_auth_sets() {
        let op = Operation::CustomJsonDapp(CustomJsonDappOperation {
            required_owner_auths: BTreeSet::new(),
            required_active_auths: BTreeSet::from([name("alice"), name("carol")]),
            required_posting_auths: BTreeSet::from([name("bob")]),
            id: "game".to_string(),
            json: "{\"move\":3}".to_string(),
        });
        let mut buffer = Vec::new();
        OperationSerializer::new().serialize(&op, &mut buffer).unwrap();
        assert_eq!(decode(&buffer), op);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut buffer = Vec::new();
        U32VarIntSerializer::new().serialize(&40, &mut buffer).unwrap();
        assert!(OperationDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let op = Operation::UpdateBproducer(UpdateBproducerOperation {
            bobserver: name("alice"),
            approve: true,
        });
        let mut buffer = Vec::new();
        OperationSerializer::new().serialize(&op, &mut buffer).unwrap();
        *buffer.last_mut().unwrap() = 2;
        assert!(OperationDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn virtual_kinds_are_flagged() {
        let op = Operation::FillMiningReward(FillMiningRewardOperation {
            account: name("alice"),
            reward: Amount::from_raw(1),
        });
        assert!(op.is_virtual());
        assert_eq!(op.name(), "fill_mining_reward");
        assert!(!Operation::Mining(MiningOperation { account: name("alice") }).is_virtual());
    }
}
