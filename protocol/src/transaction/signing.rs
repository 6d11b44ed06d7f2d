//! Transaction signing.
//!
//! Signing computes [`Transaction::digest`], hands it to the [`Signer`], and
//! appends the result. Several signers may sign the same transaction
//! (multi-sig); each appends one signature. Once the first signature is
//! attached the operations, fees, and block reference are frozen, because
//! any change there would invalidate the signatures already collected.

use tracing::debug;

use super::{Transaction, TransactionError};
use crate::chain::PublicKey;
use crate::crypto::{CompactSignature, Signer};

impl Transaction {
    /// Sign with `signer` and append the signature.
    pub fn sign(&mut self, signer: &Signer) -> Result<(), TransactionError> {
        let signature = signer.sign(&self.digest())?;
        self.signatures.push(signature);
        debug!(
            tx_id = %self.id(),
            signatures = self.signatures.len(),
            "transaction signed"
        );
        Ok(())
    }

    /// Append a signature produced elsewhere (an external key holder).
    pub fn add_signature(&mut self, signature: CompactSignature) {
        self.signatures.push(signature);
    }

    /// Public keys recovered from every attached signature, in signing order.
    pub fn signers(&self) -> Result<Vec<PublicKey>, TransactionError> {
        let digest = self.digest();
        self.signatures
            .iter()
            .map(|sig| sig.recover(&digest).map_err(TransactionError::from))
            .collect()
    }

    /// `true` if `key` produced one of the attached signatures.
    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        let digest = self.digest();
        self.signatures.iter().any(|sig| sig.verify(&digest, key))
    }
}

/// Sign `tx` in place. Free-function form of [`Transaction::sign`].
pub fn sign_transaction(tx: &mut Transaction, signer: &Signer) -> Result<(), TransactionError> {
    tx.sign(signer)
}
