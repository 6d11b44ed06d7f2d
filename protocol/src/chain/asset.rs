//! Asset amounts and prices.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::ObjectId;
use crate::codec::{ByteEncode, Encoder};
use crate::config;

/// An integer amount of a specific asset, in the asset's smallest unit.
///
/// The asset id is never validated locally; the node resolves it. Amounts
/// above [`config::MAX_SHARE_SUPPLY`] are out of range for the chain and are
/// rejected by the operation builders before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: u64,
    pub asset_id: ObjectId,
}

impl AssetAmount {
    pub fn new(amount: u64, asset_id: ObjectId) -> Self {
        Self { amount, asset_id }
    }

    /// A zero amount of the given asset.
    pub fn zero(asset_id: ObjectId) -> Self {
        Self::new(0, asset_id)
    }

    /// A zero amount of the core asset. Used as the binary placeholder for a
    /// fee that has not been estimated yet.
    pub fn zero_core() -> Self {
        Self::zero(config::CORE_ASSET)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// `true` if the amount fits the chain's share type.
    pub fn is_in_range(&self) -> bool {
        self.amount <= config::MAX_SHARE_SUPPLY
    }
}

impl ByteEncode for AssetAmount {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64_le(self.amount);
        self.asset_id.encode(enc);
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset_id)
    }
}

/// An exchange ratio between two assets, as nodes report it on orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: AssetAmount,
    pub quote: AssetAmount,
}

impl ByteEncode for Price {
    fn encode(&self, enc: &mut Encoder) {
        self.base.encode(enc);
        self.quote.encode(enc);
    }
}

/// Nodes send 64-bit amounts either as JSON numbers or as decimal strings
/// (large values do not survive a JavaScript double). Accept both.
pub(crate) fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Signed(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Signed(n) => u64::try_from(n).map_err(|_| serde::de::Error::custom(format!("negative amount: {n}"))),
        Raw::Text(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_layout() {
        let amount = AssetAmount::new(1, ObjectId::asset(0));
        assert_eq!(
            hex::encode(amount.to_bytes()),
            "010000000000000000",
            "u64 LE amount followed by varint asset instance"
        );

        let amount = AssetAmount::new(100_000, ObjectId::asset(2));
        assert_eq!(hex::encode(amount.to_bytes()), "a08601000000000002");
    }

    #[test]
    fn json_layout() {
        let amount = AssetAmount::new(520, ObjectId::asset(2));
        let json = serde_json::to_value(amount).unwrap();
        assert_eq!(json, serde_json::json!({ "amount": 520, "asset_id": "1.3.2" }));
    }

    #[test]
    fn accepts_string_and_number_amounts() {
        let a: AssetAmount = serde_json::from_str(r#"{"amount":"123456789012","asset_id":"1.3.0"}"#).unwrap();
        let b: AssetAmount = serde_json::from_str(r#"{"amount":123456789012,"asset_id":"1.3.0"}"#).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<AssetAmount>(r#"{"amount":-1,"asset_id":"1.3.0"}"#).is_err());
    }

    #[test]
    fn range_check() {
        assert!(AssetAmount::new(config::MAX_SHARE_SUPPLY, config::CORE_ASSET).is_in_range());
        assert!(!AssetAmount::new(config::MAX_SHARE_SUPPLY + 1, config::CORE_ASSET).is_in_range());
    }
}
