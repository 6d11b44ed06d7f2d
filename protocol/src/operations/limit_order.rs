//! Limit order placement and cancellation.

use serde::{Serialize, Serializer};

use super::{check_account, check_amount, check_fee, encode_fee, OperationError};
use crate::chain::block::format_timestamp;
use crate::chain::{AssetAmount, Extensions, ObjectId};
use crate::codec::{ByteEncode, Encoder};

/// Offer `amount_to_sell` for at least `min_to_receive` until `expiration`
/// (Unix seconds). With `fill_or_kill` the order never rests on the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitOrderCreateOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<AssetAmount>,
    pub seller: ObjectId,
    pub amount_to_sell: AssetAmount,
    pub min_to_receive: AssetAmount,
    #[serde(serialize_with = "serialize_timestamp")]
    pub expiration: u32,
    pub fill_or_kill: bool,
    pub extensions: Extensions,
}

impl ByteEncode for LimitOrderCreateOperation {
    fn encode(&self, enc: &mut Encoder) {
        encode_fee(&self.fee, enc);
        self.seller.encode(enc);
        self.amount_to_sell.encode(enc);
        self.min_to_receive.encode(enc);
        enc.put_u32_le(self.expiration);
        enc.put_bool(self.fill_or_kill);
        self.extensions.encode(enc);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitOrderCancelOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<AssetAmount>,
    pub fee_paying_account: ObjectId,
    pub order: ObjectId,
    pub extensions: Extensions,
}

impl LimitOrderCancelOperation {
    pub fn new(fee_paying_account: ObjectId, order: ObjectId) -> Self {
        Self {
            fee: None,
            fee_paying_account,
            order,
            extensions: Extensions,
        }
    }

    pub fn with_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }
}

impl ByteEncode for LimitOrderCancelOperation {
    fn encode(&self, enc: &mut Encoder) {
        encode_fee(&self.fee, enc);
        self.fee_paying_account.encode(enc);
        self.order.encode(enc);
        self.extensions.encode(enc);
    }
}

fn serialize_timestamp<S: Serializer>(seconds: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*seconds))
}

#[derive(Debug, Default)]
pub struct LimitOrderCreateOperationBuilder {
    fee: Option<AssetAmount>,
    seller: Option<ObjectId>,
    amount_to_sell: Option<AssetAmount>,
    min_to_receive: Option<AssetAmount>,
    expiration: Option<u32>,
    fill_or_kill: bool,
}

impl LimitOrderCreateOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn seller(mut self, seller: ObjectId) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn amount_to_sell(mut self, amount: AssetAmount) -> Self {
        self.amount_to_sell = Some(amount);
        self
    }

    pub fn min_to_receive(mut self, amount: AssetAmount) -> Self {
        self.min_to_receive = Some(amount);
        self
    }

    pub fn expiration(mut self, seconds: u32) -> Self {
        self.expiration = Some(seconds);
        self
    }

    pub fn fill_or_kill(mut self, fill_or_kill: bool) -> Self {
        self.fill_or_kill = fill_or_kill;
        self
    }

    pub fn build(self) -> Result<LimitOrderCreateOperation, OperationError> {
        let seller = self.seller.ok_or(OperationError::MissingField("seller"))?;
        let amount_to_sell = self.amount_to_sell.ok_or(OperationError::MissingField("amount_to_sell"))?;
        let min_to_receive = self.min_to_receive.ok_or(OperationError::MissingField("min_to_receive"))?;
        let expiration = self.expiration.ok_or(OperationError::MissingField("expiration"))?;

        check_account(&seller)?;
        check_amount(&amount_to_sell, "amount_to_sell")?;
        check_amount(&min_to_receive, "min_to_receive")?;
        check_fee(&self.fee)?;
        if amount_to_sell.asset_id == min_to_receive.asset_id {
            return Err(OperationError::SameAsset(amount_to_sell.asset_id.to_string()));
        }

        Ok(LimitOrderCreateOperation {
            fee: self.fee,
            seller,
            amount_to_sell,
            min_to_receive,
            expiration,
            fill_or_kill: self.fill_or_kill,
            extensions: Extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> LimitOrderCreateOperationBuilder {
        LimitOrderCreateOperationBuilder::new()
            .seller(ObjectId::account(28828))
            .amount_to_sell(AssetAmount::new(100_000, ObjectId::asset(0)))
            .min_to_receive(AssetAmount::new(520, ObjectId::asset(2)))
            .expiration(1_500_000_000)
    }

    #[test]
    fn create_binary_layout() {
        let op = order().fill_or_kill(true).build().unwrap();
        assert_eq!(
            hex::encode(op.to_bytes()),
            concat!(
                "000000000000000000", // fee placeholder
                "9ce101",             // seller
                "a08601000000000000", // 100000 of 1.3.0
                "080200000000000002", // 520 of 1.3.2
                "002f6859",           // expiration
                "01",                 // fill_or_kill
                "00",                 // extensions
            )
        );
    }

    #[test]
    fn create_json_uses_timestamp_string() {
        let json = serde_json::to_value(order().build().unwrap()).unwrap();
        assert_eq!(json["expiration"], "2017-07-14T02:40:00");
        assert_eq!(json["fill_or_kill"], false);
        assert!(json.get("fee").is_none());
    }

    #[test]
    fn create_rejects_self_trade() {
        let err = order()
            .min_to_receive(AssetAmount::new(1, ObjectId::asset(0)))
            .build()
            .unwrap_err();
        assert_eq!(err, OperationError::SameAsset("1.3.0".into()));
    }

    #[test]
    fn create_requires_expiration() {
        let builder = LimitOrderCreateOperationBuilder::new()
            .seller(ObjectId::account(1))
            .amount_to_sell(AssetAmount::new(1, ObjectId::asset(0)))
            .min_to_receive(AssetAmount::new(1, ObjectId::asset(1)));
        assert_eq!(builder.build(), Err(OperationError::MissingField("expiration")));
    }

    #[test]
    fn cancel_layout() {
        let op = LimitOrderCancelOperation::new(ObjectId::account(18), ObjectId::limit_order(300))
            .with_fee(AssetAmount::new(1, ObjectId::asset(0)));
        assert_eq!(
            hex::encode(op.to_bytes()),
            concat!("010000000000000000", "12", "ac02", "00")
        );
    }
}
