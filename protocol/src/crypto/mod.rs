//! # Cryptographic Primitives
//!
//! SHA-256 hashing and secp256k1 signing. Everything here is a thin wrapper
//! over `sha2` and `secp256k1`; the only protocol logic is the canonical
//! signature rule and the 65-byte recoverable signature layout nodes expect.

pub mod hash;
pub mod signer;

pub use hash::{sha256, sha256_concat};
pub use signer::{CompactSignature, Signer, SignerError};
