// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>
//! Binary serialization primitives.
//!
//! Every encodable type gets a dedicated `*Serializer` and `*Deserializer`
//! struct implementing the traits below. Deserializers are nom parsers generic
//! over the error type so callers choose between cheap and verbose errors.

#![warn(missing_docs)]

use displaydoc::Display;
use nom::bytes::complete::take;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Errors raised while encoding
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String too long: {0}
    StringTooLong(String),
    /// General error {0}
    GeneralError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeserializeErrorKind {
    Nom(ErrorKind),
    Context(&'static str),
}

/// Verbose parse error keeping the context stack, innermost failure first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], DeserializeErrorKind)>,
}

impl<'a> DeserializeError<'a> {
    /// Contexts attached to the error, from the innermost parser outwards
    pub fn contexts(&self) -> Vec<&'static str> {
        self.errors
            .iter()
            .filter_map(|(_, kind)| match kind {
                DeserializeErrorKind::Context(ctx) => Some(*ctx),
                DeserializeErrorKind::Nom(_) => None,
            })
            .collect()
    }
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, DeserializeErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Context(ctx)));
        other
    }
}

impl fmt::Display for DeserializeError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (input, kind) in self.errors.iter().rev() {
            if !first {
                write!(f, " / ")?;
            }
            first = false;
            match kind {
                DeserializeErrorKind::Context(ctx) => write!(f, "{}", ctx)?,
                DeserializeErrorKind::Nom(kind) => {
                    write!(f, "{:?} ({} bytes left)", kind, input.len())?
                }
            }
        }
        Ok(())
    }
}

/// Encodes a value of type `T` at the end of a buffer
pub trait Serializer<T> {
    /// Append the binary form of `value` to `buffer`
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Decodes a value of type `T` from the start of a buffer
pub trait Deserializer<T> {
    /// Parse a value and return the rest of the buffer with it
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

macro_rules! gen_varint {
    ($($type:ident, $ser:ident, $buffer:ident, $de:ident, $ctx:expr);*) => {
        $(
            #[doc = concat!("Serializer for `", stringify!($type), "` in varint form")]
            #[derive(Clone, Default)]
            pub struct $ser;

            impl $ser {
                #[doc = concat!("Creates a `", stringify!($ser), "`")]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $ser {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice(unsigned_varint::encode::$type(
                        *value,
                        &mut unsigned_varint::encode::$buffer(),
                    ));
                    Ok(())
                }
            }

            #[doc = concat!("Deserializer for `", stringify!($type), "` in varint form, bounded by a range")]
            #[derive(Clone)]
            pub struct $de {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $de {
                #[doc = concat!("Creates a `", stringify!($de), "` accepting values within the bounds")]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Deserializer<$type> for $de {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context($ctx, |input: &'a [u8]| {
                        let (value, rest) = unsigned_varint::decode::$type(input)
                            .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Fail)))?;
                        if !self.range.contains(&value) {
                            return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)));
                        }
                        Ok((rest, value))
                    })(buffer)
                }
            }
        )*
    };
}

gen_varint! {
    u16, U16VarIntSerializer, u16_buffer, U16VarIntDeserializer, "Failed u16 deserialization";
    u32, U32VarIntSerializer, u32_buffer, U32VarIntDeserializer, "Failed u32 deserialization";
    u64, U64VarIntSerializer, u64_buffer, U64VarIntDeserializer, "Failed u64 deserialization"
}

/// Serializer for length-prefixed byte strings
#[derive(Clone, Default)]
pub struct BytesSerializer {
    length_serializer: U32VarIntSerializer,
}

impl BytesSerializer {
    /// Creates a `BytesSerializer`
    pub const fn new() -> Self {
        Self {
            length_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<Vec<u8>> for BytesSerializer {
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let length: u32 = value.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig(format!("byte string of {} bytes", value.len()))
        })?;
        self.length_serializer.serialize(&length, buffer)?;
        buffer.extend_from_slice(value);
        Ok(())
    }
}

/// Deserializer for length-prefixed byte strings with a maximal length
#[derive(Clone)]
pub struct BytesDeserializer {
    length_deserializer: U32VarIntDeserializer,
}

impl BytesDeserializer {
    /// Creates a `BytesDeserializer` accepting at most `max_length` bytes
    pub const fn new(max_length: u32) -> Self {
        Self {
            length_deserializer: U32VarIntDeserializer::new(
                Bound::Included(0),
                Bound::Included(max_length),
            ),
        }
    }
}

impl Deserializer<Vec<u8>> for BytesDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        context("Failed bytes deserialization", |input: &'a [u8]| {
            let (rest, length) = self.length_deserializer.deserialize::<E>(input)?;
            let (rest, bytes) = take::<u32, &'a [u8], E>(length)(rest)?;
            Ok((rest, bytes.to_vec()))
        })(buffer)
    }
}

/// Serializer for UTF-8 strings, length-prefixed
#[derive(Clone, Default)]
pub struct StringSerializer {
    bytes_serializer: BytesSerializer,
}

impl StringSerializer {
    /// Creates a `StringSerializer`
    pub const fn new() -> Self {
        Self {
            bytes_serializer: BytesSerializer::new(),
        }
    }
}

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.bytes_serializer
            .serialize(&value.as_bytes().to_vec(), buffer)
    }
}

/// Deserializer for UTF-8 strings with a maximal byte length
#[derive(Clone)]
pub struct StringDeserializer {
    bytes_deserializer: BytesDeserializer,
}

impl StringDeserializer {
    /// Creates a `StringDeserializer` accepting at most `max_length` bytes
    pub const fn new(max_length: u32) -> Self {
        Self {
            bytes_deserializer: BytesDeserializer::new(max_length),
        }
    }
}

impl Deserializer<String> for StringDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        context("Failed string deserialization", |input: &'a [u8]| {
            let (rest, bytes) = self.bytes_deserializer.deserialize::<E>(input)?;
            let value = String::from_utf8(bytes)
                .map_err(|_| nom::Err::Error(E::from_error_kind(input, ErrorKind::Char)))?;
            Ok((rest, value))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn varint_respects_bounds() {
        let mut buffer = Vec::new();
        U64VarIntSerializer::new().serialize(&300, &mut buffer).unwrap();
        let (rest, value) = U64VarIntDeserializer::new(Bound::Included(0), Bound::Included(300))
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, 300);

        let err = U64VarIntDeserializer::new(Bound::Included(0), Bound::Excluded(300))
            .deserialize::<DeserializeError>(&buffer)
            .unwrap_err();
        assert_matches!(err, nom::Err::Error(e) if e.contexts() == vec!["Failed u64 deserialization"]);
    }

    #[test]
    fn string_length_is_bounded() {
        let mut buffer = Vec::new();
        StringSerializer::new()
            .serialize(&"sigmaengine".to_string(), &mut buffer)
            .unwrap();
        let (_, value) = StringDeserializer::new(16)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert_eq!(value, "sigmaengine");
        assert!(StringDeserializer::new(4)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let mut buffer = Vec::new();
        BytesSerializer::new()
            .serialize(&vec![1, 2, 3, 4], &mut buffer)
            .unwrap();
        buffer.pop();
        assert!(BytesDeserializer::new(64)
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }
}
