//! # Transaction Signer
//!
//! Wraps one secp256k1 private key and produces the recoverable signatures
//! Graphene nodes accept.
//!
//! ## Layout
//!
//! A signature on the wire is 65 bytes: a header byte `27 + 4 + recid`
//! (the `+ 4` marks a compressed public key) followed by compact `r || s`.
//! The recovery id lets a node recover the signer's public key from the
//! signature and digest alone.
//!
//! ## Canonical signatures
//!
//! Nodes reject signatures where `r` or `s` has its high bit set or carries a
//! superfluous leading zero byte. RFC 6979 nonces do not guarantee that, so
//! [`Signer::sign`] retries with extra nonce data derived from the attempt
//! counter. The sequence of nonces is fixed, so the result is still
//! deterministic per `(key, digest)`.

use std::fmt;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SecretKey, SECP256K1};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::trace;

use super::hash::sha256_concat;
use crate::chain::PublicKey;
use crate::config::{COMPACT_SIGNATURE_LENGTH, DIGEST_LENGTH, MAX_CANONICAL_ATTEMPTS, SIGNATURE_HEADER_BASE, SIGNATURE_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("invalid private key material")]
    InvalidKey,

    #[error("digest must be {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("no canonical signature found after {0} attempts")]
    NonCanonical(u32),

    #[error("invalid signature bytes")]
    InvalidSignature,

    #[error("public key recovery failed")]
    RecoveryFailed,
}

// ---------------------------------------------------------------------------
// CompactSignature
// ---------------------------------------------------------------------------

/// A 65-byte recoverable signature: header byte then `r || s`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature([u8; SIGNATURE_LENGTH]);

impl CompactSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| SignerError::InvalidSignature)?;
        let recid = bytes[0].wrapping_sub(SIGNATURE_HEADER_BASE);
        if recid > 3 {
            return Err(SignerError::InvalidSignature);
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(text: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(text).map_err(|_| SignerError::InvalidSignature)?;
        Self::from_bytes(&bytes)
    }

    fn from_recoverable(signature: &RecoverableSignature) -> Self {
        let (recid, compact) = signature.serialize_compact();
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        // recid is 0..=3
        bytes[0] = SIGNATURE_HEADER_BASE + recid.to_i32() as u8;
        bytes[1..].copy_from_slice(&compact);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[0] - SIGNATURE_HEADER_BASE
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0[1..])
    }

    /// Recover the public key that produced this signature over `digest`.
    pub fn recover(&self, digest: &[u8]) -> Result<PublicKey, SignerError> {
        let message = message_from_digest(digest)?;
        let recid = RecoveryId::from_i32(i32::from(self.recovery_id())).map_err(|_| SignerError::InvalidSignature)?;
        let signature =
            RecoverableSignature::from_compact(&self.0[1..], recid).map_err(|_| SignerError::InvalidSignature)?;
        let key = SECP256K1
            .recover_ecdsa(&message, &signature)
            .map_err(|_| SignerError::RecoveryFailed)?;
        Ok(PublicKey::from_secp(key))
    }

    /// `true` if this signature over `digest` was made by `key`.
    pub fn verify(&self, digest: &[u8], key: &PublicKey) -> bool {
        matches!(self.recover(digest), Ok(recovered) if recovered == *key)
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", self.to_hex())
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Graphene's canonical rule over compact `r || s`.
fn is_canonical(compact: &[u8]) -> bool {
    debug_assert_eq!(compact.len(), COMPACT_SIGNATURE_LENGTH);
    compact[0] & 0x80 == 0
        && !(compact[0] == 0 && compact[1] & 0x80 == 0)
        && compact[32] & 0x80 == 0
        && !(compact[32] == 0 && compact[33] & 0x80 == 0)
}

fn message_from_digest(digest: &[u8]) -> Result<Message, SignerError> {
    let digest: [u8; DIGEST_LENGTH] = digest.try_into().map_err(|_| SignerError::InvalidDigestLength {
        expected: DIGEST_LENGTH,
        actual: digest.len(),
    })?;
    Ok(Message::from_digest(digest))
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Signer {
    secret: SecretKey,
    public: PublicKey,
}

impl Signer {
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = PublicKey::from_secp(secp256k1::PublicKey::from_secret_key_global(&secret));
        Self { secret, public }
    }

    /// 32 raw bytes of scalar. Zero and values at or above the curve order
    /// are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| SignerError::InvalidKey)?;
        Ok(Self::from_secret(secret))
    }

    pub fn from_hex(text: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(text.trim()).map_err(|_| SignerError::InvalidKey)?;
        Self::from_bytes(&bytes)
    }

    /// Fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret(secret)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Sign a 32-byte digest, returning a canonical recoverable signature.
    pub fn sign(&self, digest: &[u8]) -> Result<CompactSignature, SignerError> {
        let message = message_from_digest(digest)?;

        for attempt in 0..MAX_CANONICAL_ATTEMPTS {
            let signature = if attempt == 0 {
                SECP256K1.sign_ecdsa_recoverable(&message, &self.secret)
            } else {
                let extra = sha256_concat(&[digest, &attempt.to_le_bytes()[..]]);
                SECP256K1.sign_ecdsa_recoverable_with_noncedata(&message, &self.secret, &extra)
            };

            let compact = CompactSignature::from_recoverable(&signature);
            if compact.is_canonical() {
                if attempt > 0 {
                    trace!(attempt, "canonical signature found after retry");
                }
                return Ok(compact);
            }
        }
        Err(SignerError::NonCanonical(MAX_CANONICAL_ATTEMPTS))
    }
}

// Never print the secret.
impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("public", &self.public).finish_non_exhaustive()
    }
}
