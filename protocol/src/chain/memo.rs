//! Memo payloads attached to transfers.
//!
//! Encryption happens outside this crate; a `Memo` only carries the result.

use serde::{Serialize, Serializer};

use super::PublicKey;
use crate::codec::{ByteEncode, Encoder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memo {
    pub from: PublicKey,
    pub to: PublicKey,
    #[serde(serialize_with = "serialize_nonce")]
    pub nonce: u64,
    #[serde(serialize_with = "serialize_hex")]
    pub message: Vec<u8>,
}

impl Memo {
    pub fn new(from: PublicKey, to: PublicKey, nonce: u64, encrypted: Vec<u8>) -> Self {
        Self {
            from,
            to,
            nonce,
            message: encrypted,
        }
    }
}

impl ByteEncode for Memo {
    fn encode(&self, enc: &mut Encoder) {
        self.from.encode(enc);
        self.to.encode(enc);
        enc.put_u64_le(self.nonce);
        enc.put_bytes(&self.message);
    }
}

// Nonces use the full u64 range; nodes expect them as decimal strings.
fn serialize_nonce<S: Serializer>(nonce: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(nonce)
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
