// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>
//! Unsigned time management.
//!
//! Chain time is carried inside blocks, never read from the host clock, so
//! this crate deliberately has no way to obtain the current wall time.
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use sigma_serialization::{Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer};
use std::fmt;
use std::convert::TryInto;
use std::ops::Bound;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Time structure used everywhere.
/// milliseconds since 01/01/1970, or a duration in milliseconds.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SigmaTime(u64);

/// Serializer for `SigmaTime`
#[derive(Clone)]
pub struct SigmaTimeSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl SigmaTimeSerializer {
    /// Creates a `SigmaTimeSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Default for SigmaTimeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<SigmaTime> for SigmaTimeSerializer {
    /// ```
    /// use sigma_serialization::Serializer;
    /// use sigma_time::{SigmaTime, SigmaTimeSerializer};
    ///
    /// let time: SigmaTime = SigmaTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = SigmaTimeSerializer::new();
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// ```
    fn serialize(
        &self,
        value: &SigmaTime,
        buffer: &mut Vec<u8>,
    ) -> Result<(), sigma_serialization::SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `SigmaTime`
#[derive(Clone)]
pub struct SigmaTimeDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

fn bound_to_millis(bound: Bound<SigmaTime>) -> Bound<u64> {
    match bound {
        Bound::Included(time) => Bound::Included(time.to_millis()),
        Bound::Excluded(time) => Bound::Excluded(time.to_millis()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl SigmaTimeDeserializer {
    /// Creates a `SigmaTimeDeserializer`
    ///
    /// Arguments:
    /// * range: accepted range for the time to deserialize
    pub fn new(range: (Bound<SigmaTime>, Bound<SigmaTime>)) -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                bound_to_millis(range.0),
                bound_to_millis(range.1),
            ),
        }
    }
}

impl Deserializer<SigmaTime> for SigmaTimeDeserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use sigma_serialization::{Serializer, Deserializer, DeserializeError};
    /// use sigma_time::{SigmaTime, SigmaTimeSerializer, SigmaTimeDeserializer};
    ///
    /// let time: SigmaTime = SigmaTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = SigmaTimeSerializer::new();
    /// let deserializer = SigmaTimeDeserializer::new((Included(SigmaTime::from_millis(0)), Included(SigmaTime::max())));
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// let (rest, time_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(time, time_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], SigmaTime, E> {
        context("Failed SigmaTime deserialization", |input: &'a [u8]| {
            self.u64_deserializer
                .deserialize::<E>(input)
                .map(|(rest, res)| (rest, SigmaTime::from_millis(res)))
        })(buffer)
    }
}

/// Plain milliseconds, the same rendering for instants and durations.
/// See `format_instant` for a calendar rendering.
impl fmt::Display for SigmaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl FromStr for SigmaTime {
    type Err = crate::TimeError;

    /// Conversion from `&str`.
    ///
    /// ```
    /// # use sigma_time::*;
    /// # use std::str::FromStr;
    /// let duration: &str = "42";
    /// let time : SigmaTime = SigmaTime::from_millis(42);
    ///
    /// assert_eq!(time, SigmaTime::from_str(duration).unwrap());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SigmaTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

impl SigmaTime {
    /// Smallest time interval
    pub const EPSILON: SigmaTime = SigmaTime(1);

    /// Conversion from `u64`, representing a timestamp in milliseconds.
    pub const fn from_millis(value: u64) -> Self {
        SigmaTime(value)
    }

    /// Conversion from a number of seconds
    pub const fn from_secs(value: u64) -> Self {
        SigmaTime(value * 1000)
    }

    /// Conversion from a number of days
    pub const fn from_days(value: u64) -> Self {
        SigmaTime(value * 24 * 60 * 60 * 1000)
    }

    /// Conversion to `u64`, representing milliseconds.
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let time_2 : SigmaTime = SigmaTime::from_millis(7);
    /// assert_eq!(time_2.saturating_sub(time_1), SigmaTime::from_millis(0));
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: SigmaTime) -> Self {
        SigmaTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// assert_eq!(SigmaTime::max().saturating_add(time_1), SigmaTime::max());
    /// ```
    #[must_use]
    pub fn saturating_add(self, t: SigmaTime) -> Self {
        SigmaTime(self.0.saturating_add(t.0))
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let time_2 : SigmaTime = SigmaTime::from_millis(7);
    /// let res : SigmaTime = time_1.checked_sub(time_2).unwrap();
    /// assert_eq!(res, SigmaTime::from_millis(42-7));
    /// assert!(time_2.checked_sub(time_1).is_err());
    /// ```
    pub fn checked_sub(self, t: SigmaTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(SigmaTime)
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let time_2 : SigmaTime = SigmaTime::from_millis(7);
    /// let res : SigmaTime = time_1.checked_add(time_2).unwrap();
    /// assert_eq!(res, SigmaTime::from_millis(42+7))
    /// ```
    pub fn checked_add(self, t: SigmaTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(SigmaTime)
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let time_2 : SigmaTime = SigmaTime::from_millis(7);
    /// let res : u64 = time_1.checked_div_time(time_2).unwrap();
    /// assert_eq!(res,42/7)
    /// ```
    pub fn checked_div_time(self, t: SigmaTime) -> Result<u64, TimeError> {
        self.0
            .checked_div(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("division error".to_string()))
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let res : SigmaTime = time_1.checked_mul(7).unwrap();
    /// assert_eq!(res,SigmaTime::from_millis(42*7))
    /// ```
    pub fn checked_mul(self, n: u64) -> Result<Self, TimeError> {
        self.0
            .checked_mul(n)
            .ok_or_else(|| TimeError::CheckedOperationError("multiplication error".to_string()))
            .map(SigmaTime)
    }

    /// ```
    /// # use sigma_time::*;
    /// let time_1 : SigmaTime = SigmaTime::from_millis(42);
    /// let time_2 : SigmaTime = SigmaTime::from_millis(10);
    /// let res : SigmaTime = time_1.checked_rem_time(time_2).unwrap();
    /// assert_eq!(res,SigmaTime::from_millis(42%10))
    /// ```
    pub fn checked_rem_time(self, t: SigmaTime) -> Result<Self, TimeError> {
        self.0
            .checked_rem(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("remainder error".to_string()))
            .map(SigmaTime)
    }

    /// RFC3339 rendering of an instant, to the second
    ///
    /// ```
    /// # use sigma_time::*;
    /// let sigma_time : SigmaTime = SigmaTime::from_millis(1_640_995_200_000);
    /// assert_eq!(sigma_time.format_instant().unwrap(), String::from("2022-01-01T00:00:00Z"))
    /// ```
    pub fn format_instant(&self) -> Result<String, TimeError> {
        let seconds: i64 = (self.to_millis() / 1000)
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        let naive =
            OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| TimeError::ConversionError)?;
        naive
            .format(&Rfc3339)
            .map_err(|_| TimeError::ConversionError)
    }

    /// Largest representable time
    pub const fn max() -> SigmaTime {
        SigmaTime(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_serialization::DeserializeError;

    #[test]
    fn deserializer_enforces_range() {
        let mut buffer = Vec::new();
        SigmaTimeSerializer::new()
            .serialize(&SigmaTime::from_secs(10), &mut buffer)
            .unwrap();
        let deserializer = SigmaTimeDeserializer::new((
            Bound::Included(SigmaTime::from_millis(0)),
            Bound::Excluded(SigmaTime::from_secs(10)),
        ));
        assert!(deserializer
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn instants_are_formatted_as_rfc3339() {
        assert_eq!(
            SigmaTime::from_millis(1_672_531_200_999).format_instant().unwrap(),
            "2023-01-01T00:00:00Z"
        );
        assert_eq!(SigmaTime::max().format_instant(), Err(TimeError::ConversionError));
    }

    #[test]
    fn serde_is_plain_millis() {
        let time = SigmaTime::from_days(1);
        assert_eq!(serde_json::to_string(&time).unwrap(), "86400000");
    }
}
