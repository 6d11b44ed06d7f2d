//! # Chain Value Types
//!
//! The vocabulary shared by operations, transactions, and RPC responses:
//! object ids, asset amounts, public keys, authorities, account options,
//! memos, and the block reference data a transaction is anchored to.
//!
//! ## Architecture
//!
//! ```text
//! object_id.rs: `space.type.instance` ids, varint-encoded on the wire
//! asset.rs: AssetAmount and Price
//! public_key.rs: compressed secp256k1 keys with an optional text form
//! authority.rs: weighted key/account permission sets
//! account.rs: AccountOptions and VoteId
//! memo.rs: pre-encrypted memo payloads
//! block.rs: ChainId and BlockData (reference block + expiration)
//! ```
//!
//! Every type here implements [`crate::codec::ByteEncode`] for the binary
//! form and `serde::Serialize` for the structured form nodes accept.

pub mod account;
pub mod asset;
pub mod authority;
pub mod block;
pub mod memo;
pub mod object_id;
pub mod public_key;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::codec::{ByteEncode, Encoder};

pub use account::{AccountOptions, VoteId};
pub use asset::{AssetAmount, Price};
pub use authority::Authority;
pub use block::{BlockData, ChainId};
pub use memo::Memo;
pub use object_id::ObjectId;
pub use public_key::PublicKey;

/// Errors raised while parsing chain values from text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("malformed object id: {0}")]
    MalformedObjectId(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("malformed block id: {0}")]
    MalformedBlockId(String),
}

/// An empty extension set. Encodes as `varint(0)` and `[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extensions;

impl ByteEncode for Extensions {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_empty_extensions();
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let empty: [(); 0] = [];
        empty.serialize(serializer)
    }
}
