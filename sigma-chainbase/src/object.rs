// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Sequential identity of a record of type `T`
pub struct ObjectId<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ObjectId<T> {
    /// Wraps a raw id
    pub const fn new(id: u64) -> Self {
        ObjectId {
            id,
            _marker: PhantomData,
        }
    }

    /// Raw id
    pub const fn to_raw(&self) -> u64 {
        self.id
    }
}

impl<T> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObjectId<T> {}

impl<T> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ObjectId<T> {}

impl<T> PartialOrd for ObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ObjectId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for ObjectId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<T> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl<T> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for ObjectId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id)
    }
}

impl<'de, T> Deserialize<'de> for ObjectId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(ObjectId::new)
    }
}

/// Declaration of a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    /// index name, used in error messages
    pub name: &'static str,
    /// whether two records may share a key
    pub unique: bool,
}

impl IndexDef {
    /// Index where each key maps to at most one record
    pub const fn unique(name: &'static str) -> Self {
        IndexDef { name, unique: true }
    }

    /// Index where keys may repeat, ties ordered by id
    pub const fn non_unique(name: &'static str) -> Self {
        IndexDef {
            name,
            unique: false,
        }
    }
}

/// One component of an index key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum KeyPart {
    #[allow(missing_docs)]
    Bool(bool),
    #[allow(missing_docs)]
    U64(u64),
    #[allow(missing_docs)]
    Str(String),
    #[allow(missing_docs)]
    Bytes(Vec<u8>),
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::U64(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::U64(u64::from(value))
    }
}

impl From<u16> for KeyPart {
    fn from(value: u16) -> Self {
        KeyPart::U64(u64::from(value))
    }
}

impl From<u8> for KeyPart {
    fn from(value: u8) -> Self {
        KeyPart::U64(u64::from(value))
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(value: Vec<u8>) -> Self {
        KeyPart::Bytes(value)
    }
}

impl From<&[u8]> for KeyPart {
    fn from(value: &[u8]) -> Self {
        KeyPart::Bytes(value.to_vec())
    }
}

/// Ordered tuple of key parts, compared lexicographically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct IndexKey(Vec<KeyPart>);

impl IndexKey {
    /// Builds a key from its parts
    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        IndexKey(parts)
    }

    /// The parts of the key
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// true if `prefix` is a leading part of this key
    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (position, part) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            match part {
                KeyPart::Bool(value) => write!(f, "{}", value)?,
                KeyPart::U64(value) => write!(f, "{}", value)?,
                KeyPart::Str(value) => write!(f, "{:?}", value)?,
                KeyPart::Bytes(value) => write!(f, "{}", bs58::encode(value).into_string())?,
            }
        }
        write!(f, ")")
    }
}

/// Builds an [`IndexKey`] from values convertible into [`KeyPart`]
///
/// ```
/// # use sigma_chainbase::{index_key, KeyPart};
/// let key = index_key!("alice", 7u64);
/// assert_eq!(key.parts(), &[KeyPart::Str("alice".into()), KeyPart::U64(7)]);
/// ```
#[macro_export]
macro_rules! index_key {
    ($($part:expr),* $(,)?) => {
        $crate::IndexKey::from_parts(vec![$($crate::KeyPart::from($part)),*])
    };
}

/// Handle on the secondary index at `position` in `T::INDEXES`
pub struct Index<T> {
    position: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Index<T> {
    /// Addresses the index declared at `position`
    pub const fn at(position: usize) -> Self {
        Index {
            position,
            _marker: PhantomData,
        }
    }

    /// Position in the declaration list
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index({})", self.position)
    }
}

/// A record type stored in its own table
pub trait Object: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    /// table identifier, unique within a database
    const TABLE_ID: u16;
    /// table name, used in error messages
    const TABLE_NAME: &'static str;
    /// secondary indexes, addressed by position
    const INDEXES: &'static [IndexDef];

    /// identity of the record
    fn id(&self) -> ObjectId<Self>;

    /// one key per entry of `INDEXES`, in the same order
    fn index_keys(&self) -> Vec<IndexKey>;
}
