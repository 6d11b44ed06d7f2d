//! History API calls.

use serde_json::json;

use super::handler::handler;
use super::models::{MarketBucket, OperationHistory};
use crate::chain::ObjectId;

/// Account history by sequence number, counting from the account's first
/// operation. `start == 0` means "most recent".
#[derive(Debug, Clone, Copy)]
pub struct GetRelativeAccountHistory {
    pub account: ObjectId,
    pub stop: u64,
    pub limit: u32,
    pub start: u64,
}
handler!(
    GetRelativeAccountHistory => History "get_relative_account_history",
    Vec<OperationHistory>,
    |this| vec![json!(this.account), json!(this.stop), json!(this.limit), json!(this.start)]
);

/// OHLCV buckets of `bucket_seconds` between two timestamps.
#[derive(Debug, Clone)]
pub struct GetMarketHistory {
    pub base: ObjectId,
    pub quote: ObjectId,
    pub bucket_seconds: u32,
    pub start: String,
    pub end: String,
}
handler!(
    GetMarketHistory => History "get_market_history",
    Vec<MarketBucket>,
    |this| vec![
        json!(this.base),
        json!(this.quote),
        json!(this.bucket_seconds),
        json!(this.start),
        json!(this.end),
    ]
);
