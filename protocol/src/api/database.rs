//! Database API calls.

use serde_json::{json, Value};

use super::handler::handler;
use super::models::{Account, Asset, BlockHeader, DynamicGlobalProperties, LimitOrder, MarketTrade, RequiredFee};
use crate::chain::{AssetAmount, ChainId, ObjectId, PublicKey};
use crate::operations::Operation;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetChainId;
handler!(GetChainId => Database "get_chain_id", ChainId, |_| vec![]);

#[derive(Debug, Clone, Copy, Default)]
pub struct GetDynamicGlobalProperties;
handler!(
    GetDynamicGlobalProperties => Database "get_dynamic_global_properties",
    DynamicGlobalProperties,
    |_| vec![]
);

/// Arbitrary objects by id. Unknown ids come back as `null`.
#[derive(Debug, Clone)]
pub struct GetObjects {
    pub ids: Vec<ObjectId>,
}
handler!(GetObjects => Database "get_objects", Vec<Value>, |this| vec![json!(this.ids)]);

#[derive(Debug, Clone)]
pub struct GetAccounts {
    pub ids: Vec<ObjectId>,
}
handler!(GetAccounts => Database "get_accounts", Vec<Option<Account>>, |this| vec![json!(this.ids)]);

#[derive(Debug, Clone)]
pub struct GetAccountByName {
    pub name: String,
}
handler!(
    GetAccountByName => Database "get_account_by_name",
    Option<Account>,
    |this| vec![json!(this.name)]
);

/// Up to `limit` account names at or after `lower_bound`, with their ids.
#[derive(Debug, Clone)]
pub struct LookupAccounts {
    pub lower_bound: String,
    pub limit: u32,
}
handler!(
    LookupAccounts => Database "lookup_accounts",
    Vec<(String, ObjectId)>,
    |this| vec![json!(this.lower_bound), json!(this.limit)]
);

/// Balances of one account. An empty asset list means every asset held.
#[derive(Debug, Clone)]
pub struct GetAccountBalances {
    pub account: ObjectId,
    pub assets: Vec<ObjectId>,
}
handler!(
    GetAccountBalances => Database "get_account_balances",
    Vec<AssetAmount>,
    |this| vec![json!(this.account), json!(this.assets)]
);

#[derive(Debug, Clone, Copy)]
pub struct GetBlockHeader {
    pub block_num: u64,
}
handler!(
    GetBlockHeader => Database "get_block_header",
    Option<BlockHeader>,
    |this| vec![json!(this.block_num)]
);

/// Accounts that reference each key in an authority, per key.
#[derive(Debug, Clone)]
pub struct GetKeyReferences {
    pub keys: Vec<PublicKey>,
}
handler!(
    GetKeyReferences => Database "get_key_references",
    Vec<Vec<ObjectId>>,
    |this| vec![json!(this.keys)]
);

/// Open orders in the `base`/`quote` market, both directions.
#[derive(Debug, Clone, Copy)]
pub struct GetLimitOrders {
    pub base: ObjectId,
    pub quote: ObjectId,
    pub limit: u32,
}
handler!(
    GetLimitOrders => Database "get_limit_orders",
    Vec<LimitOrder>,
    |this| vec![json!(this.base), json!(this.quote), json!(this.limit)]
);

/// Fees for each operation, quoted in `asset`.
#[derive(Debug, Clone)]
pub struct GetRequiredFees {
    pub operations: Vec<Operation>,
    pub asset: ObjectId,
}
handler!(
    GetRequiredFees => Database "get_required_fees",
    Vec<RequiredFee>,
    |this| {
        let ops: Vec<Value> = this.operations.iter().map(Operation::to_wire_object).collect();
        vec![Value::Array(ops), json!(this.asset)]
    }
);

/// Fills between `start` and `stop` (timestamps, newest first).
#[derive(Debug, Clone)]
pub struct GetTradeHistory {
    pub base: String,
    pub quote: String,
    pub start: String,
    pub stop: String,
    pub limit: u32,
}
handler!(
    GetTradeHistory => Database "get_trade_history",
    Vec<MarketTrade>,
    |this| vec![
        json!(this.base),
        json!(this.quote),
        json!(this.start),
        json!(this.stop),
        json!(this.limit),
    ]
);

#[derive(Debug, Clone)]
pub struct LookupAssetSymbols {
    /// Symbols or asset ids; nodes accept either.
    pub symbols_or_ids: Vec<String>,
}
handler!(
    LookupAssetSymbols => Database "lookup_asset_symbols",
    Vec<Option<Asset>>,
    |this| vec![json!(this.symbols_or_ids)]
);

#[derive(Debug, Clone)]
pub struct ListAssets {
    pub lower_bound_symbol: String,
    pub limit: u32,
}
handler!(
    ListAssets => Database "list_assets",
    Vec<Asset>,
    |this| vec![json!(this.lower_bound_symbol), json!(this.limit)]
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handler::RequestHandler;
    use crate::api::rpc::Api;
    use crate::operations::LimitOrderCancelOperation;

    #[test]
    fn test_params_shapes() {
        assert_eq!(GetChainId.params(), Vec::<Value>::new());
        assert_eq!(GetChainId.api(), Api::Database);
        assert_eq!(
            GetAccountBalances {
                account: ObjectId::account(18),
                assets: vec![ObjectId::asset(0)]
            }
            .params(),
            vec![json!("1.2.18"), json!(["1.3.0"])]
        );
        assert_eq!(
            GetLimitOrders {
                base: ObjectId::asset(0),
                quote: ObjectId::asset(2),
                limit: 100
            }
            .params(),
            vec![json!("1.3.0"), json!("1.3.2"), json!(100)]
        );
    }

    #[test]
    fn test_required_fees_sends_wire_operations() {
        let op = Operation::from(LimitOrderCancelOperation::new(ObjectId::account(1), ObjectId::limit_order(2)));
        let handler = GetRequiredFees {
            operations: vec![op.clone()],
            asset: ObjectId::asset(0),
        };
        assert_eq!(handler.method(), "get_required_fees");
        assert_eq!(handler.params(), vec![json!([op.to_wire_object()]), json!("1.3.0")]);
    }

    #[test]
    fn test_parse_typed_results() {
        let chain = GetChainId
            .parse(json!("4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8"))
            .unwrap();
        assert_eq!(chain.to_hex().len(), 64);

        let accounts = LookupAccounts {
            lower_bound: "bilthon".into(),
            limit: 2,
        }
        .parse(json!([["bilthon-1", "1.2.139205"], ["bilthon-2", "1.2.139207"]]))
        .unwrap();
        assert_eq!(accounts[1], ("bilthon-2".to_string(), ObjectId::account(139_207)));

        let missing = GetAccountByName { name: "nobody".into() }.parse(Value::Null).unwrap();
        assert!(missing.is_none());
    }
}
