//! # Node API
//!
//! Wire types for the JSON-RPC dialect Graphene nodes speak, the
//! [`RequestHandler`] contract, and one handler per remote call.
//!
//! ## Architecture
//!
//! ```text
//! rpc.rs: request envelope, inbound frame classification, RpcError
//! handler.rs: RequestHandler trait
//! models.rs: typed response payloads
//! database.rs: database API handlers
//! history.rs: history API handlers
//! broadcast.rs: network_broadcast, login, and asset API handlers
//! ```

pub mod broadcast;
pub mod database;
pub mod handler;
pub mod history;
pub mod models;
pub mod rpc;

pub use broadcast::{BroadcastTransaction, BroadcastTransactionSynchronous, GetAllAssetHolders, Login};
pub use database::{
    GetAccountBalances, GetAccountByName, GetAccounts, GetBlockHeader, GetChainId, GetDynamicGlobalProperties,
    GetKeyReferences, GetLimitOrders, GetObjects, GetRequiredFees, GetTradeHistory, ListAssets, LookupAccounts,
    LookupAssetSymbols,
};
pub use handler::RequestHandler;
pub use history::{GetMarketHistory, GetRelativeAccountHistory};
pub use models::{
    Account, Asset, AssetHolderCount, BlockHeader, BroadcastConfirmation, DynamicGlobalProperties, LimitOrder,
    MarketBucket, MarketTrade, OperationHistory, RequiredFee,
};
pub use rpc::{parse_inbound, Api, InboundError, InboundMessage, RpcError, RpcRequest};
