//! Transaction construction via the builder pattern.
//!
//! The builder does not sign; that happens in [`super::signing`], which keeps
//! construction testable without key material.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::TransactionError;
use crate::chain::{AssetAmount, BlockData, ChainId};
use crate::codec::{ByteEncode, Encoder};
use crate::config::{DEFAULT_EXPIRATION, TRANSACTION_ID_LENGTH};
use crate::crypto::{sha256, sha256_concat, CompactSignature};
use crate::operations::Operation;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An ordered bundle of operations bound to one chain and one block
/// reference.
///
/// Operation order is significant and never changed here. An empty operation
/// list is representable; whether it is acceptable is up to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(super) chain_id: ChainId,
    pub(super) block_data: BlockData,
    pub(super) operations: Vec<Operation>,
    pub(super) signatures: Vec<CompactSignature>,
}

impl Transaction {
    pub fn new(chain_id: ChainId, block_data: BlockData, operations: Vec<Operation>) -> Self {
        Self {
            chain_id,
            block_data,
            operations,
            signatures: Vec::new(),
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn block_data(&self) -> &BlockData {
        &self.block_data
    }

    pub fn expiration(&self) -> u32 {
        self.block_data.expiration
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn signatures(&self) -> &[CompactSignature] {
        &self.signatures
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    fn ensure_unsealed(&self) -> Result<(), TransactionError> {
        if self.is_signed() {
            Err(TransactionError::Sealed(self.signatures.len()))
        } else {
            Ok(())
        }
    }

    pub fn push_operation(&mut self, operation: impl Into<Operation>) -> Result<(), TransactionError> {
        self.ensure_unsealed()?;
        self.operations.push(operation.into());
        Ok(())
    }

    pub fn set_block_data(&mut self, block_data: BlockData) -> Result<(), TransactionError> {
        self.ensure_unsealed()?;
        self.block_data = block_data;
        Ok(())
    }

    pub fn set_fee(&mut self, index: usize, fee: AssetAmount) -> Result<(), TransactionError> {
        self.ensure_unsealed()?;
        let len = self.operations.len();
        let operation = self
            .operations
            .get_mut(index)
            .ok_or(TransactionError::NoSuchOperation { index, len })?;
        operation.set_fee(fee);
        Ok(())
    }

    /// Indices of operations that still have no fee.
    pub fn operations_without_fee(&self) -> Vec<usize> {
        self.operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.fee().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Serialized transaction without chain id or signatures.
    pub fn to_bytes(&self) -> Vec<u8> {
        ByteEncode::to_bytes(self)
    }

    /// SHA-256 over `chain_id || to_bytes()`. This is what gets signed.
    pub fn digest(&self) -> [u8; 32] {
        sha256_concat(&[self.chain_id.as_bytes().as_slice(), self.to_bytes().as_slice()])
    }

    /// Hex of the first 20 bytes of SHA-256 over the unsigned bytes. The
    /// chain id is not included, and signatures do not change it.
    pub fn id(&self) -> String {
        let hash = sha256(&self.to_bytes());
        hex::encode(&hash[..TRANSACTION_ID_LENGTH])
    }

    /// Structured form for `broadcast_transaction`.
    pub fn to_wire_object(&self) -> Value {
        let operations: Vec<Value> = self.operations.iter().map(Operation::to_wire_object).collect();
        let signatures: Vec<String> = self.signatures.iter().map(CompactSignature::to_hex).collect();
        json!({
            "ref_block_num": self.block_data.ref_block_num,
            "ref_block_prefix": self.block_data.ref_block_prefix,
            "expiration": self.block_data.expiration_string(),
            "operations": operations,
            "extensions": [],
            "signatures": signatures,
        })
    }
}

impl ByteEncode for Transaction {
    fn encode(&self, enc: &mut Encoder) {
        self.block_data.encode(enc);
        enc.put_seq(&self.operations);
        enc.put_empty_extensions();
    }
}

impl Serialize for Transaction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire_object().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of an unsigned [`Transaction`].
///
/// ```
/// use graphene_protocol::chain::{AssetAmount, ChainId, ObjectId};
/// use graphene_protocol::config::BITSHARES_MAINNET_CHAIN_ID;
/// use graphene_protocol::operations::TransferOperationBuilder;
/// use graphene_protocol::transaction::TransactionBuilder;
///
/// let transfer = TransferOperationBuilder::new()
///     .from(ObjectId::account(28828))
///     .to(ObjectId::account(18))
///     .amount(AssetAmount::new(1, ObjectId::asset(0)))
///     .build()
///     .unwrap();
///
/// let tx = TransactionBuilder::new(ChainId::from_hex(BITSHARES_MAINNET_CHAIN_ID).unwrap())
///     .operation(transfer)
///     .build();
/// assert_eq!(tx.operations().len(), 1);
/// ```
///
/// Without an explicit expiration the builder uses now plus
/// [`DEFAULT_EXPIRATION`]. The block reference defaults to zero and is
/// normally filled from the node's dynamic global properties before signing.
#[derive(Debug)]
pub struct TransactionBuilder {
    chain_id: ChainId,
    ref_block_num: u16,
    ref_block_prefix: u32,
    expiration: Option<u32>,
    operations: Vec<Operation>,
}

impl TransactionBuilder {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            ref_block_num: 0,
            ref_block_prefix: 0,
            expiration: None,
            operations: Vec::new(),
        }
    }

    pub fn block_data(mut self, block_data: BlockData) -> Self {
        self.ref_block_num = block_data.ref_block_num;
        self.ref_block_prefix = block_data.ref_block_prefix;
        self.expiration = Some(block_data.expiration);
        self
    }

    pub fn reference_block(mut self, ref_block_num: u16, ref_block_prefix: u32) -> Self {
        self.ref_block_num = ref_block_num;
        self.ref_block_prefix = ref_block_prefix;
        self
    }

    /// Expiration as Unix seconds.
    pub fn expiration(mut self, seconds: u32) -> Self {
        self.expiration = Some(seconds);
        self
    }

    pub fn operation(mut self, operation: impl Into<Operation>) -> Self {
        self.operations.push(operation.into());
        self
    }

    pub fn operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    pub fn build(self) -> Transaction {
        let expiration = self.expiration.unwrap_or_else(default_expiration);
        Transaction::new(
            self.chain_id,
            BlockData::new(self.ref_block_num, self.ref_block_prefix, expiration),
            self.operations,
        )
    }
}

fn default_expiration() -> u32 {
    let now = Utc::now().timestamp() + DEFAULT_EXPIRATION.as_secs() as i64;
    u32::try_from(now).unwrap_or(u32::MAX)
}
