//! Object identifiers.
//!
//! Every object on a Graphene chain is addressed as `space.type.instance`:
//! `1.2.x` is an account, `1.3.x` an asset, `1.7.x` a limit order, and so on.
//! The binary form only carries the instance as a varint because the field's
//! declared type already pins space and type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ChainError;
use crate::codec::{ByteEncode, Encoder};

/// Protocol object space.
pub const PROTOCOL_SPACE: u8 = 1;
/// Implementation object space (dynamic properties, balances, ...).
pub const IMPLEMENTATION_SPACE: u8 = 2;

pub const ACCOUNT_TYPE: u8 = 2;
pub const ASSET_TYPE: u8 = 3;
pub const LIMIT_ORDER_TYPE: u8 = 7;

/// A `space.type.instance` object id.
///
/// Ordering is numeric on (space, type, instance), which is the order the
/// chain uses for sorted account sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    space: u8,
    kind: u8,
    instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, kind: u8, instance: u64) -> Self {
        Self {
            space,
            kind,
            instance,
        }
    }

    /// `1.2.instance`
    pub const fn account(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, ACCOUNT_TYPE, instance)
    }

    /// `1.3.instance`
    pub const fn asset(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, ASSET_TYPE, instance)
    }

    /// `1.7.instance`
    pub const fn limit_order(instance: u64) -> Self {
        Self::new(PROTOCOL_SPACE, LIMIT_ORDER_TYPE, instance)
    }

    pub fn space(&self) -> u8 {
        self.space
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_account(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.kind == ACCOUNT_TYPE
    }

    pub fn is_asset(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.kind == ASSET_TYPE
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.kind, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ChainError::MalformedObjectId(s.to_string());
        let mut parts = s.split('.');
        let space = parts.next().ok_or_else(malformed)?;
        let kind = parts.next().ok_or_else(malformed)?;
        let instance = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self {
            space: space.parse().map_err(|_| malformed())?,
            kind: kind.parse().map_err(|_| malformed())?,
            instance: instance.parse().map_err(|_| malformed())?,
        })
    }
}

impl ByteEncode for ObjectId {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_varint(self.instance);
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
