//! Typed payloads of node responses.
//!
//! Only the fields this crate reads are typed; objects that nodes extend
//! between releases keep the remainder in a flattened `extra` map so nothing
//! is lost when a caller needs it.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::chain::asset::deserialize_amount;
use crate::chain::block::parse_timestamp;
use crate::chain::{AssetAmount, BlockData, ChainError, ObjectId, Price};

// ---------------------------------------------------------------------------
// Chain state
// ---------------------------------------------------------------------------

/// `2.1.0`, the head-of-chain summary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DynamicGlobalProperties {
    pub id: ObjectId,
    pub head_block_number: u64,
    pub head_block_id: String,
    /// Head block time, `%Y-%m-%dT%H:%M:%S`.
    pub time: String,
    #[serde(default)]
    pub last_irreversible_block_num: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DynamicGlobalProperties {
    pub fn head_time(&self) -> Result<u32, ChainError> {
        parse_timestamp(&self.time)
    }

    /// Block reference to the head block, expiring `window` after head time.
    pub fn block_data(&self, window: Duration) -> Result<BlockData, ChainError> {
        let window = u32::try_from(window.as_secs()).unwrap_or(u32::MAX);
        let expiration = self.head_time()?.saturating_add(window);
        BlockData::from_head_block(self.head_block_number, &self.head_block_id, expiration)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockHeader {
    pub previous: String,
    pub timestamp: String,
    pub witness: ObjectId,
    pub transaction_merkle_root: String,
    #[serde(default)]
    pub extensions: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Accounts and assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Asset {
    pub id: ObjectId,
    pub symbol: String,
    pub precision: u8,
    pub issuer: ObjectId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of `get_all_asset_holders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetHolderCount {
    pub asset_id: ObjectId,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LimitOrder {
    pub id: ObjectId,
    pub expiration: String,
    pub seller: ObjectId,
    #[serde(deserialize_with = "deserialize_amount")]
    pub for_sale: u64,
    pub sell_price: Price,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub deferred_fee: Option<u64>,
}

/// A fill reported by `get_trade_history`. Prices and amounts arrive as
/// decimal text already scaled by asset precision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketTrade {
    #[serde(default)]
    pub sequence: Option<i64>,
    pub date: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BucketKey {
    pub base: ObjectId,
    pub quote: ObjectId,
    pub seconds: u32,
    pub open: String,
}

/// One OHLCV bucket from `get_market_history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketBucket {
    pub id: ObjectId,
    pub key: BucketKey,
    #[serde(deserialize_with = "deserialize_amount")]
    pub high_base: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub high_quote: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub low_base: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub low_quote: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub open_base: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub open_quote: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub close_base: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub close_quote: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub base_volume: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub quote_volume: u64,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// An applied operation as recorded in account history. The operation body
/// stays raw: history can contain operation types this crate never builds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationHistory {
    pub id: ObjectId,
    pub op: Value,
    #[serde(default)]
    pub result: Value,
    pub block_num: u64,
    pub trx_in_block: u32,
    pub op_in_trx: u32,
    pub virtual_op: u32,
}

// ---------------------------------------------------------------------------
// Fees and broadcast
// ---------------------------------------------------------------------------

/// Entry of `get_required_fees`. Proposals report their own fee alongside the
/// fees of the proposed operations; only the outer fee applies here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequiredFee {
    Flat(AssetAmount),
    Nested(AssetAmount, Vec<Value>),
}

impl RequiredFee {
    pub fn amount(&self) -> AssetAmount {
        match self {
            Self::Flat(amount) | Self::Nested(amount, _) => *amount,
        }
    }
}

/// Reply of `broadcast_transaction_synchronous`: where the transaction landed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfirmation {
    /// Transaction id (hex).
    pub id: String,
    pub block_num: u64,
    pub trx_num: u64,
    #[serde(default)]
    pub expired: bool,
}

fn deserialize_optional_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "deserialize_amount")] u64);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {other}"))),
    }
}
