//! Chain identity and the block reference a transaction is anchored to.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ChainError;
use crate::codec::{ByteEncode, Encoder};

/// Timestamp layout nodes use in JSON: UTC, second precision, no zone suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The 32-byte chain id mixed into every signing digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId([u8; 32]);

impl ChainId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(text: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(text).map_err(|_| ChainError::InvalidChainId(text.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::InvalidChainId(text.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.to_hex())
    }
}

impl FromStr for ChainId {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Reference block and expiration.
///
/// `ref_block_num` is the low 16 bits of a recent block number and
/// `ref_block_prefix` the second 32-bit word of that block's id. Nodes reject
/// a transaction whose reference does not match a block they know, which
/// pins the transaction to one fork. `expiration` is seconds since the Unix
/// epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockData {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: u32,
}

impl BlockData {
    pub fn new(ref_block_num: u16, ref_block_prefix: u32, expiration: u32) -> Self {
        Self {
            ref_block_num,
            ref_block_prefix,
            expiration,
        }
    }

    /// Derive block data from a head block number and its hex id.
    pub fn from_head_block(head_block_number: u64, head_block_id: &str, expiration: u32) -> Result<Self, ChainError> {
        let malformed = || ChainError::MalformedBlockId(head_block_id.to_string());
        let id = hex::decode(head_block_id).map_err(|_| malformed())?;
        let word: [u8; 4] = id.get(4..8).ok_or_else(malformed)?.try_into().map_err(|_| malformed())?;
        Ok(Self {
            ref_block_num: (head_block_number & 0xFFFF) as u16,
            ref_block_prefix: u32::from_le_bytes(word),
            expiration,
        })
    }

    pub fn expiration_string(&self) -> String {
        format_timestamp(self.expiration)
    }
}

impl ByteEncode for BlockData {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u16_le(self.ref_block_num);
        enc.put_u32_le(self.ref_block_prefix);
        enc.put_u32_le(self.expiration);
    }
}

pub fn format_timestamp(seconds: u32) -> String {
    match DateTime::from_timestamp(i64::from(seconds), 0) {
        Some(time) => time.format(TIMESTAMP_FORMAT).to_string(),
        // every u32 is a representable instant
        None => String::new(),
    }
}

/// Parse a node timestamp. A trailing `Z` is tolerated.
pub fn parse_timestamp(text: &str) -> Result<u32, ChainError> {
    let trimmed = text.trim_end_matches('Z');
    let parsed = NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT)
        .map_err(|_| ChainError::MalformedTimestamp(text.to_string()))?;
    u32::try_from(parsed.and_utc().timestamp()).map_err(|_| ChainError::MalformedTimestamp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BITSHARES_MAINNET_CHAIN_ID;

    #[test]
    fn chain_id_hex() {
        let id = ChainId::from_hex(BITSHARES_MAINNET_CHAIN_ID).unwrap();
        assert_eq!(id.to_string(), BITSHARES_MAINNET_CHAIN_ID);
        assert!(ChainId::from_hex("abcd").is_err());
        assert!(ChainId::from_hex("not hex").is_err());
    }

    #[test]
    fn block_data_from_head() {
        let data = BlockData::from_head_block(
            0x0123_4567,
            "01234567aabbccdd00000000000000000000000000",
            1_500_000_000,
        )
        .unwrap();
        assert_eq!(data.ref_block_num, 0x4567);
        assert_eq!(data.ref_block_prefix, 0xDDCC_BBAA);
        assert!(BlockData::from_head_block(1, "0123", 0).is_err());
    }

    #[test]
    fn binary_layout() {
        let data = BlockData::new(0x4567, 0xDDCC_BBAA, 0x0102_0304);
        assert_eq!(hex::encode(data.to_bytes()), "6745aabbccdd04030201");
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00");
        assert_eq!(format_timestamp(1_500_000_000), "2017-07-14T02:40:00");
        assert_eq!(parse_timestamp("2017-07-14T02:40:00").unwrap(), 1_500_000_000);
        assert_eq!(parse_timestamp("2017-07-14T02:40:00Z").unwrap(), 1_500_000_000);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
