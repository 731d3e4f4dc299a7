// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::config::constants::{
    MAX_ACCOUNT_NAME_LENGTH, MAX_PUBLIC_KEY_LENGTH, MIN_ACCOUNT_NAME_LENGTH, PUBLIC_KEY_PREFIX,
};
use crate::ModelsError;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use sigma_serialization::{
    Deserializer, SerializeError, Serializer, StringDeserializer, StringSerializer,
};
use std::fmt;
use std::str::FromStr;

/// Human readable account identity.
///
/// Between 3 and 16 characters, made of dot separated labels of at least 3
/// characters each. A label starts with a lowercase letter, ends with a
/// letter or a digit and contains only lowercase letters, digits and single
/// dashes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    if bytes.len() < MIN_ACCOUNT_NAME_LENGTH {
        return false;
    }
    if !bytes[0].is_ascii_lowercase() {
        return false;
    }
    let last = bytes[bytes.len() - 1];
    if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
        return false;
    }
    bytes.windows(2).all(|pair| !(pair[0] == b'-' && pair[1] == b'-'))
        && bytes
            .iter()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == b'-')
}

impl AccountName {
    /// Checks the naming rules without allocating
    pub fn is_valid(name: &str) -> bool {
        (MIN_ACCOUNT_NAME_LENGTH..=MAX_ACCOUNT_NAME_LENGTH).contains(&name.len())
            && name.split('.').all(is_valid_label)
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountName {
    type Err = ModelsError;

    /// ```
    /// # use sigma_models::AccountName;
    /// # use std::str::FromStr;
    /// assert!(AccountName::from_str("alice").is_ok());
    /// assert!(AccountName::from_str("sgt.reward").is_ok());
    /// assert!(AccountName::from_str("al").is_err());
    /// assert!(AccountName::from_str("Alice").is_err());
    /// assert!(AccountName::from_str("ab.cde").is_err());
    /// assert!(AccountName::from_str("bad--dash").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !AccountName::is_valid(s) {
            return Err(ModelsError::InvalidAccountName(s.to_string()));
        }
        Ok(AccountName(s.to_string()))
    }
}

impl TryFrom<String> for AccountName {
    type Error = ModelsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !AccountName::is_valid(&value) {
            return Err(ModelsError::InvalidAccountName(value));
        }
        Ok(AccountName(value))
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializer for `AccountName`
#[derive(Clone, Default)]
pub struct AccountNameSerializer {
    string_serializer: StringSerializer,
}

impl AccountNameSerializer {
    /// Creates an `AccountNameSerializer`
    pub const fn new() -> Self {
        Self {
            string_serializer: StringSerializer::new(),
        }
    }
}

impl Serializer<AccountName> for AccountNameSerializer {
    fn serialize(&self, value: &AccountName, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.string_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `AccountName`, enforcing the naming rules
#[derive(Clone)]
pub struct AccountNameDeserializer {
    string_deserializer: StringDeserializer,
}

impl AccountNameDeserializer {
    /// Creates an `AccountNameDeserializer`
    pub const fn new() -> Self {
        Self {
            string_deserializer: StringDeserializer::new(MAX_ACCOUNT_NAME_LENGTH as u32),
        }
    }
}

impl Default for AccountNameDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<AccountName> for AccountNameDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], AccountName, E> {
        context("Failed AccountName deserialization", |input: &'a [u8]| {
            let (rest, name) = self.string_deserializer.deserialize::<E>(input)?;
            let name = AccountName::try_from(name)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
            Ok((rest, name))
        })(buffer)
    }
}

/// Public key in its text form: the chain prefix followed by base58 data.
///
/// Signature verification happens before operations reach the chain, so
/// keys are only stored and compared, never used cryptographically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PublicKey {
    type Error = ModelsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let data = value
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or_else(|| ModelsError::InvalidPublicKey(format!("missing prefix: {}", value)))?;
        if data.is_empty() || value.len() > MAX_PUBLIC_KEY_LENGTH {
            return Err(ModelsError::InvalidPublicKey(format!(
                "bad length: {}",
                value
            )));
        }
        bs58::decode(data)
            .into_vec()
            .map_err(|err| ModelsError::InvalidPublicKey(format!("{}: {}", value, err)))?;
        Ok(PublicKey(value))
    }
}

impl FromStr for PublicKey {
    type Err = ModelsError;

    /// ```
    /// # use sigma_models::PublicKey;
    /// # use std::str::FromStr;
    /// assert!(PublicKey::from_str("SGT7ZPrxj5P9C3h5t3i1m").is_ok());
    /// assert!(PublicKey::from_str("STM7ZPrxj5P9C3h5t3i1m").is_err());
    /// assert!(PublicKey::from_str("SGT0OIl").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::try_from(s.to_string())
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializer for `PublicKey`
#[derive(Clone, Default)]
pub struct PublicKeySerializer {
    string_serializer: StringSerializer,
}

impl PublicKeySerializer {
    /// Creates a `PublicKeySerializer`
    pub const fn new() -> Self {
        Self {
            string_serializer: StringSerializer::new(),
        }
    }
}

impl Serializer<PublicKey> for PublicKeySerializer {
    fn serialize(&self, value: &PublicKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.string_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `PublicKey`
#[derive(Clone)]
pub struct PublicKeyDeserializer {
    string_deserializer: StringDeserializer,
}

impl PublicKeyDeserializer {
    /// Creates a `PublicKeyDeserializer`
    pub const fn new() -> Self {
        Self {
            string_deserializer: StringDeserializer::new(MAX_PUBLIC_KEY_LENGTH as u32),
        }
    }
}

impl Default for PublicKeyDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<PublicKey> for PublicKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], PublicKey, E> {
        context("Failed PublicKey deserialization", |input: &'a [u8]| {
            let (rest, key) = self.string_deserializer.deserialize::<E>(input)?;
            let key = PublicKey::try_from(key)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)))?;
            Ok((rest, key))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rules() {
        assert!(AccountName::is_valid("sigmaengine"));
        assert!(AccountName::is_valid("abc-def"));
        assert!(AccountName::is_valid("a12"));
        assert!(!AccountName::is_valid("abc-"));
        assert!(!AccountName::is_valid("1abc"));
        assert!(!AccountName::is_valid("abc..def"));
        assert!(!AccountName::is_valid("averyveryverylongname"));
    }

    #[test]
    fn serde_rejects_invalid_names() {
        let name: AccountName = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert!(serde_json::from_str::<AccountName>("\"A\"").is_err());
    }
}
