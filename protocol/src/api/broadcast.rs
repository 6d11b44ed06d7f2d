//! Network broadcast, login, and asset API calls.

use serde_json::{json, Value};

use super::handler::handler;
use super::models::{AssetHolderCount, BroadcastConfirmation};
use crate::transaction::Transaction;

/// Credential handshake. Nodes without access control accept any
/// credentials, including empty ones.
#[derive(Debug, Clone)]
pub struct Login {
    pub username: String,
    pub password: String,
}
handler!(Login => Login "login", bool, |this| vec![json!(this.username), json!(this.password)]);

/// Fire-and-forget broadcast: the node validates and relays, replying `null`.
#[derive(Debug, Clone)]
pub struct BroadcastTransaction {
    pub transaction: Value,
}

impl BroadcastTransaction {
    pub fn new(transaction: &Transaction) -> Self {
        Self {
            transaction: transaction.to_wire_object(),
        }
    }
}
handler!(
    BroadcastTransaction => NetworkBroadcast "broadcast_transaction",
    (),
    |this| vec![this.transaction.clone()]
);

/// Broadcast and wait until the transaction lands in a block.
#[derive(Debug, Clone)]
pub struct BroadcastTransactionSynchronous {
    pub transaction: Value,
}

impl BroadcastTransactionSynchronous {
    pub fn new(transaction: &Transaction) -> Self {
        Self {
            transaction: transaction.to_wire_object(),
        }
    }
}
handler!(
    BroadcastTransactionSynchronous => NetworkBroadcast "broadcast_transaction_synchronous",
    BroadcastConfirmation,
    |this| vec![this.transaction.clone()]
);

#[derive(Debug, Clone, Copy, Default)]
pub struct GetAllAssetHolders;
handler!(GetAllAssetHolders => Asset "get_all_asset_holders", Vec<AssetHolderCount>, |_| vec![]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handler::RequestHandler;
    use crate::api::rpc::Api;
    use crate::chain::{ChainId, ObjectId};
    use crate::transaction::TransactionBuilder;

    #[test]
    fn login_params() {
        let login = Login {
            username: "alice".into(),
            password: "pw".into(),
        };
        assert_eq!(login.api(), Api::Login);
        assert_eq!(login.to_request(1).params, json!(["login", "login", ["alice", "pw"]]));
        assert!(login.parse(json!(true)).unwrap());
    }

    #[test]
    fn broadcast_carries_wire_transaction() {
        let tx = TransactionBuilder::new(ChainId::from_bytes([0; 32])).expiration(5).build();
        let handler = BroadcastTransaction::new(&tx);
        assert_eq!(handler.api(), Api::NetworkBroadcast);
        assert_eq!(handler.params(), vec![tx.to_wire_object()]);
        handler.parse(Value::Null).unwrap();
    }

    #[test]
    fn synchronous_broadcast_parses_confirmation() {
        let tx = TransactionBuilder::new(ChainId::from_bytes([0; 32])).expiration(5).build();
        let conf = BroadcastTransactionSynchronous::new(&tx)
            .parse(json!({"id": tx.id(), "block_num": 77, "trx_num": 2, "expired": false}))
            .unwrap();
        assert_eq!(conf.id, tx.id());
        assert_eq!(conf.block_num, 77);
    }

    #[test]
    fn asset_holders() {
        let rows = GetAllAssetHolders
            .parse(json!([{"asset_id": "1.3.0", "count": 12345}]))
            .unwrap();
        assert_eq!(rows[0].asset_id, ObjectId::asset(0));
        assert_eq!(GetAllAssetHolders.api(), Api::Asset);
    }
}
