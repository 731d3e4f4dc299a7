// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::account::{
    AccountName, AccountNameDeserializer, AccountNameSerializer, PublicKey,
    PublicKeyDeserializer, PublicKeySerializer,
};
use crate::config::constants::MAX_AUTHORITY_MEMBERSHIP;
use crate::ModelsError;
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use sigma_serialization::{
    Deserializer, SerializeError, Serializer, U16VarIntDeserializer, U16VarIntSerializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use std::collections::BTreeMap;
use std::ops::Bound::Included;

/// Permission level of an authority, ordered from weakest to strongest
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AuthorityLevel {
    /// social actions and custom payloads
    Posting = 0,
    /// funds movements
    Active = 1,
    /// account control
    Owner = 2,
}

impl AuthorityLevel {
    /// true if holding `self` is enough to act at the `required` level
    pub fn satisfies(&self, required: AuthorityLevel) -> bool {
        *self >= required
    }
}

/// Weighted set of keys and accounts that must reach a threshold to approve
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Authority {
    /// sum of weights needed to approve
    pub weight_threshold: u32,
    /// accounts whose own authority counts with the given weight
    pub account_auths: BTreeMap<AccountName, u16>,
    /// keys counting with the given weight
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    /// Authority satisfied by a single key
    pub fn from_key(key: PublicKey) -> Self {
        Authority {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::from([(key, 1)]),
        }
    }

    /// Authority satisfied by another account
    pub fn from_account(account: AccountName) -> Self {
        Authority {
            weight_threshold: 1,
            account_auths: BTreeMap::from([(account, 1)]),
            key_auths: BTreeMap::new(),
        }
    }

    /// Number of members
    pub fn num_auths(&self) -> usize {
        self.account_auths.len() + self.key_auths.len()
    }

    /// true if the weights of every member together cannot reach the threshold
    pub fn is_impossible(&self) -> bool {
        let total: u64 = self
            .account_auths
            .values()
            .chain(self.key_auths.values())
            .map(|weight| u64::from(*weight))
            .sum();
        total < u64::from(self.weight_threshold)
    }

    /// Structural validation, independent of chain state
    pub fn validate(&self) -> Result<(), ModelsError> {
        if self.num_auths() > MAX_AUTHORITY_MEMBERSHIP {
            return Err(ModelsError::InvalidAuthority(format!(
                "{} members exceed the limit of {}",
                self.num_auths(),
                MAX_AUTHORITY_MEMBERSHIP
            )));
        }
        if self.weight_threshold == 0 {
            return Err(ModelsError::InvalidAuthority(
                "weight threshold cannot be zero".to_string(),
            ));
        }
        if self.is_impossible() {
            return Err(ModelsError::InvalidAuthority(
                "weight threshold cannot be reached".to_string(),
            ));
        }
        Ok(())
    }
}

/// An authority level of an account whose signatures were verified upstream
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Approval {
    /// approving account
    pub account: AccountName,
    /// level of the verified signature
    pub level: AuthorityLevel,
}

impl Approval {
    /// Creates an approval
    pub fn new(account: AccountName, level: AuthorityLevel) -> Self {
        Approval { account, level }
    }
}

/// Serializer for `Authority`
#[derive(Clone, Default)]
pub struct AuthoritySerializer {
    u16_serializer: U16VarIntSerializer,
    u32_serializer: U32VarIntSerializer,
    account_name_serializer: AccountNameSerializer,
    public_key_serializer: PublicKeySerializer,
}

impl AuthoritySerializer {
    /// Creates an `AuthoritySerializer`
    pub const fn new() -> Self {
        Self {
            u16_serializer: U16VarIntSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            account_name_serializer: AccountNameSerializer::new(),
            public_key_serializer: PublicKeySerializer::new(),
        }
    }

    fn serialize_count(&self, count: usize, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let count: u32 = count
            .try_into()
            .map_err(|_| SerializeError::NumberTooBig(format!("{} authority members", count)))?;
        self.u32_serializer.serialize(&count, buffer)
    }
}

impl Serializer<Authority> for AuthoritySerializer {
    fn serialize(&self, value: &Authority, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer
            .serialize(&value.weight_threshold, buffer)?;
        self.serialize_count(value.account_auths.len(), buffer)?;
        for (account, weight) in &value.account_auths {
            self.account_name_serializer.serialize(account, buffer)?;
            self.u16_serializer.serialize(weight, buffer)?;
        }
        self.serialize_count(value.key_auths.len(), buffer)?;
        for (key, weight) in &value.key_auths {
            self.public_key_serializer.serialize(key, buffer)?;
            self.u16_serializer.serialize(weight, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Authority`
#[derive(Clone)]
pub struct AuthorityDeserializer {
    u16_deserializer: U16VarIntDeserializer,
    u32_deserializer: U32VarIntDeserializer,
    count_deserializer: U32VarIntDeserializer,
    account_name_deserializer: AccountNameDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
}

impl AuthorityDeserializer {
    /// Creates an `AuthorityDeserializer`
    pub const fn new() -> Self {
        Self {
            u16_deserializer: U16VarIntDeserializer::new(Included(0), Included(u16::MAX)),
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_AUTHORITY_MEMBERSHIP as u32),
            ),
            account_name_deserializer: AccountNameDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
        }
    }
}

impl Default for AuthorityDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Authority> for AuthorityDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Authority, E> {
        context(
            "Failed Authority deserialization",
            tuple((
                context("Failed weight_threshold deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                }),
                context(
                    "Failed account_auths deserialization",
                    length_count(
                        |input| self.count_deserializer.deserialize(input),
                        tuple((
                            |input| self.account_name_deserializer.deserialize(input),
                            |input| self.u16_deserializer.deserialize(input),
                        )),
                    ),
                ),
                context(
                    "Failed key_auths deserialization",
                    length_count(
                        |input| self.count_deserializer.deserialize(input),
                        tuple((
                            |input| self.public_key_deserializer.deserialize(input),
                            |input| self.u16_deserializer.deserialize(input),
                        )),
                    ),
                ),
            )),
        )
        .map(|(weight_threshold, account_auths, key_auths)| Authority {
            weight_threshold,
            account_auths: account_auths.into_iter().collect(),
            key_auths: key_auths.into_iter().collect(),
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn levels_are_ordered() {
        assert!(AuthorityLevel::Owner.satisfies(AuthorityLevel::Active));
        assert!(AuthorityLevel::Active.satisfies(AuthorityLevel::Posting));
        assert!(!AuthorityLevel::Posting.satisfies(AuthorityLevel::Active));
    }

    #[test]
    fn impossible_authority_is_rejected() {
        let mut authority = Authority::from_account(AccountName::from_str("alice").unwrap());
        assert!(authority.validate().is_ok());
        authority.weight_threshold = 2;
        assert!(authority.is_impossible());
        assert!(authority.validate().is_err());
        authority.weight_threshold = 0;
        assert!(authority.validate().is_err());
    }
}
