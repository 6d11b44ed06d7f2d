//! # Transaction Module
//!
//! Assembly, serialization, and signing of Graphene transactions.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs: Transaction (bytes, digest, id, wire form) and TransactionBuilder
//! signing.rs: signing, multi-sig append, and signer recovery
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** with [`TransactionBuilder`]: chain id, block reference,
//!    expiration, and the ordered operations.
//! 2. **Complete** the parts only a node knows (block reference, fees) while
//!    the transaction is still unsigned.
//! 3. **Sign** with one or more [`crate::crypto::Signer`]s. The first
//!    signature seals the transaction; after that only further signatures
//!    may be appended.
//! 4. **Broadcast** the structured form through
//!    [`crate::network::BroadcastSequence`].
//!
//! ## Digest
//!
//! `sha256(chain_id || ref_block_num || ref_block_prefix || expiration ||
//! varint(op_count) || op_bytes* || varint(0))`. Signatures are not part of
//! it, and neither is anything else outside the chain id, the block
//! reference with expiration, and the operation sequence.

pub mod builder;
pub mod signing;

use thiserror::Error;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::sign_transaction;

use crate::crypto::SignerError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction is sealed: it already carries {0} signature(s)")]
    Sealed(usize),

    #[error("operation index {index} out of range ({len} operations)")]
    NoSuchOperation { index: usize, len: usize },

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),
}
