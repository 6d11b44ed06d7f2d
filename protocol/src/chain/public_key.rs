//! Compressed secp256k1 public keys.
//!
//! The binary form is the 33-byte compressed point. The human-readable form
//! (prefix + base58 checksum) belongs to the address codec, which lives
//! outside this crate; callers that have it attach it with
//! [`PublicKey::with_address`] so the structured form can carry it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use super::ChainError;
use crate::codec::{ByteEncode, Encoder};

/// Length of a compressed secp256k1 point.
pub const COMPRESSED_KEY_LENGTH: usize = 33;

#[derive(Clone)]
pub struct PublicKey {
    key: secp256k1::PublicKey,
    address: Option<String>,
}

impl PublicKey {
    pub fn from_secp(key: secp256k1::PublicKey) -> Self {
        Self { key, address: None }
    }

    /// Parse a compressed (33-byte) or uncompressed (65-byte) point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let key = secp256k1::PublicKey::from_slice(bytes).map_err(|_| ChainError::InvalidPublicKey)?;
        Ok(Self::from_secp(key))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(hex_str).map_err(|_| ChainError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Attach the text form produced by the address codec.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// The form used in JSON: the attached address, or hex of the compressed
    /// point when no address was supplied.
    pub fn text(&self) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => self.to_hex(),
        }
    }

    pub fn compressed(&self) -> [u8; COMPRESSED_KEY_LENGTH] {
        self.key.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.compressed())
    }

    pub fn as_secp(&self) -> &secp256k1::PublicKey {
        &self.key
    }
}

// Identity is the point itself; the attached text form is presentation only.
impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compressed().hash(state);
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compressed().cmp(&other.compressed())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.text())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl ByteEncode for PublicKey {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_raw(&self.compressed());
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text())
    }
}
