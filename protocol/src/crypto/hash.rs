//! # Hashing Utilities
//!
//! SHA-256 is the only digest the chain uses: transaction digests, transaction
//! ids, and the extra nonce data fed to the signer when it searches for a
//! canonical signature are all SHA-256.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use graphene_protocol::crypto::sha256;
///
/// let hash = sha256(b"graphene");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of several slices, without building the
/// concatenation first.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_concat_matches_single_pass() {
        assert_eq!(sha256_concat(&[b"ab".as_slice(), b"".as_slice(), b"c".as_slice()]), sha256(b"abc"));
    }
}
