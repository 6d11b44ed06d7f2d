//! Transfer of an asset amount between two accounts.

use serde::Serialize;

use super::{check_account, check_amount, check_fee, encode_fee, OperationError};
use crate::chain::{AssetAmount, Extensions, Memo, ObjectId};
use crate::codec::{ByteEncode, Encoder};

/// Fields in wire order: fee, from, to, amount, memo, extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<AssetAmount>,
    pub from: ObjectId,
    pub to: ObjectId,
    pub amount: AssetAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
    pub extensions: Extensions,
}

impl ByteEncode for TransferOperation {
    fn encode(&self, enc: &mut Encoder) {
        encode_fee(&self.fee, enc);
        self.from.encode(enc);
        self.to.encode(enc);
        self.amount.encode(enc);
        enc.put_optional(self.memo.as_ref());
        self.extensions.encode(enc);
    }
}

#[derive(Debug, Default)]
pub struct TransferOperationBuilder {
    fee: Option<AssetAmount>,
    from: Option<ObjectId>,
    to: Option<ObjectId>,
    amount: Option<AssetAmount>,
    memo: Option<Memo>,
}

impl TransferOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn from(mut self, account: ObjectId) -> Self {
        self.from = Some(account);
        self
    }

    pub fn to(mut self, account: ObjectId) -> Self {
        self.to = Some(account);
        self
    }

    pub fn amount(mut self, amount: AssetAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn build(self) -> Result<TransferOperation, OperationError> {
        let from = self.from.ok_or(OperationError::MissingField("from"))?;
        let to = self.to.ok_or(OperationError::MissingField("to"))?;
        let amount = self.amount.ok_or(OperationError::MissingField("amount"))?;
        check_account(&from)?;
        check_account(&to)?;
        check_amount(&amount, "amount")?;
        check_fee(&self.fee)?;

        Ok(TransferOperation {
            fee: self.fee,
            from,
            to,
            amount,
            memo: self.memo,
            extensions: Extensions,
        })
    }
}
