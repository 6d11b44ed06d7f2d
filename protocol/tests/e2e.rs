//! End-to-end tests for node connection and broadcast.
//!
//! Every test runs against an in-memory node: `MemoryConnector` hands the
//! node's end of each session to the test as a `MemoryPeer`, and the small
//! `serve` loop below answers calls the way a Graphene node would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};

use graphene_protocol::api::{GetChainId, GetDynamicGlobalProperties, RpcError};
use graphene_protocol::chain::{AssetAmount, ChainId, ObjectId};
use graphene_protocol::crypto::Signer;
use graphene_protocol::network::{
    BroadcastMode, BroadcastSequence, BroadcastStage, ConnectOptions, ConnectionError, ConnectionState,
    MemoryConnector, MemoryPeer, NodeConnection, RequestError,
};
use graphene_protocol::operations::TransferOperationBuilder;
use graphene_protocol::transaction::{Transaction, TransactionBuilder};

const CHAIN: &str = "4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8";

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Counts fatal-error hook calls and keeps the last message.
#[derive(Clone, Default)]
struct FatalLog {
    calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<String>>>,
}

impl FatalLog {
    fn options(&self) -> ConnectOptions {
        let log = self.clone();
        ConnectOptions::new().on_fatal_error(move |err| {
            log.calls.fetch_add(1, Ordering::SeqCst);
            *log.last.lock() = Some(err.to_string());
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The hook runs after the state change is published; wait for it.
    async fn wait_for_calls(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.calls() < expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("fatal hook not called");
    }
}

/// Answer every call on `peer` with `respond(method, args)` until the
/// client hangs up. Returns the calls seen, in order.
fn serve<F>(mut peer: MemoryPeer, respond: F) -> tokio::task::JoinHandle<Vec<(String, Value)>>
where
    F: Fn(&str, &Value) -> Result<Value, RpcError> + Send + 'static,
{
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(request) = peer.recv_request().await {
            let id = request["id"].as_u64().expect("request id");
            let method = request["params"][1].as_str().unwrap_or_default().to_string();
            let args = request["params"][2].clone();
            match respond(&method, &args) {
                Ok(result) => peer.reply(id, result),
                Err(error) => peer.reply_error(id, &error),
            };
            seen.push((method, args));
        }
        seen
    })
}

fn node_props() -> Value {
    json!({
        "id": "2.1.0",
        "head_block_number": 0x0123_4567u64,
        "head_block_id": "01234567aabbccdd0000000000000000000000ff",
        "time": "2017-07-14T02:40:00",
        "current_witness": "1.6.12",
        "last_irreversible_block_num": 19088700
    })
}

fn unfunded_transfer() -> Transaction {
    let transfer = TransferOperationBuilder::new()
        .from(ObjectId::account(28_828))
        .to(ObjectId::account(18))
        .amount(AssetAmount::new(1, ObjectId::asset(0)))
        .build()
        .expect("valid transfer");
    TransactionBuilder::new(CHAIN.parse::<ChainId>().expect("chain id"))
        .operation(transfer)
        .build()
}

// ---------------------------------------------------------------------------
// Failover
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failover_to_second_endpoint() {
    let connector = MemoryConnector::new();
    let mut good = connector.accept("mem://good");
    let connection = NodeConnection::new(connector);
    connection.add_endpoints(["mem://bad", "mem://good"]);

    let fatal = FatalLog::default();
    connection.connect(fatal.options()).await.unwrap();

    assert_eq!(
        connection.state(),
        ConnectionState::Connected {
            url: "mem://good".into()
        }
    );
    assert_eq!(fatal.calls(), 0);
    assert_eq!(connection.metrics().failovers_total.get(), 1);
    assert!(good.recv().await.is_some());
}

#[tokio::test]
async fn test_exhaustion_reports_once_and_resumes_with_new_endpoints() {
    let connector = MemoryConnector::new();
    let mut late = connector.accept("mem://late");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://bad");

    let fatal = FatalLog::default();
    let err = connection.connect(fatal.options()).await.unwrap_err();

    assert_eq!(err, ConnectionError::OutOfEndpoints { tried: 1 });
    assert_eq!(connection.state(), ConnectionState::Exhausted);
    assert_eq!(fatal.calls(), 1);
    assert!(fatal.last.lock().as_deref().unwrap().contains("ran out of endpoints"));

    // A fresh pass over the same list fails the same way.
    assert!(connection.connect(fatal.options()).await.is_err());
    assert_eq!(connection.state(), ConnectionState::Exhausted);
    assert_eq!(fatal.calls(), 2);

    connection.add_endpoint("mem://late");
    connection.connect(fatal.options()).await.unwrap();
    assert!(connection.state().is_connected());
    assert!(late.recv().await.is_some());
}

#[tokio::test]
async fn test_no_reconnect_stops_at_first_failure() {
    let connector = MemoryConnector::new();
    let _good = connector.accept("mem://good");
    let connection = NodeConnection::new(connector);
    connection.add_endpoints(["mem://bad", "mem://good"]);

    let fatal = FatalLog::default();
    let err = connection
        .connect(fatal.options().auto_reconnect(false))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectionError::Transport { ref url, .. } if url == "mem://bad"));
    assert_eq!(connection.state(), ConnectionState::Exhausted);
    assert_eq!(fatal.calls(), 1);

    // The index stayed put: a hopping attempt retries the failed endpoint first.
    connection.connect(fatal.options()).await.unwrap();
    assert_eq!(connection.metrics().failovers_total.get(), 1);
    assert_eq!(
        connection.state(),
        ConnectionState::Connected {
            url: "mem://good".into()
        }
    );
}

// ---------------------------------------------------------------------------
// Session loss
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_session_loss_fails_every_pending_request() {
    let connector = MemoryConnector::new();
    let mut first = connector.accept("mem://a");
    let mut second = connector.accept("mem://b");
    let connection = NodeConnection::new(connector);
    connection.add_endpoints(["mem://a", "mem://b"]);

    let fatal = FatalLog::default();
    connection.connect(fatal.options()).await.unwrap();
    let mut peer = first.recv().await.unwrap();

    let pending: Vec<_> = (0..5).map(|_| connection.submit(GetChainId).unwrap()).collect();
    for _ in 0..5 {
        peer.recv_request().await.unwrap();
    }
    assert_eq!(connection.pending_count(), 5);

    let mut states = connection.subscribe();
    peer.close("maintenance");

    for request in pending {
        assert_eq!(request.wait().await.unwrap_err(), RequestError::ConnectionLost);
    }
    assert_eq!(connection.metrics().requests_lost_total.get(), 5);

    states
        .wait_for(|s| matches!(s, ConnectionState::Connected { url } if url == "mem://b"))
        .await
        .unwrap();
    assert_eq!(fatal.calls(), 0);

    // Lost requests are not replayed on the new session.
    let mut replacement = second.recv().await.unwrap();
    assert!(tokio::time::timeout(Duration::from_millis(50), replacement.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_session_loss_on_last_endpoint_exhausts() {
    let connector = MemoryConnector::new();
    let mut only = connector.accept("mem://only");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://only");

    let fatal = FatalLog::default();
    connection.connect(fatal.options()).await.unwrap();
    let pending = connection.submit(GetChainId).unwrap();

    let mut states = connection.subscribe();
    only.recv().await.unwrap().fail("reset by peer");

    assert_eq!(pending.wait().await.unwrap_err(), RequestError::ConnectionLost);
    states
        .wait_for(|s| *s == ConnectionState::Exhausted)
        .await
        .unwrap();
    fatal.wait_for_calls(1).await;

    // The node came back: a new pass starts at the first endpoint again.
    connection.connect(fatal.options()).await.unwrap();
    assert_eq!(
        connection.state(),
        ConnectionState::Connected {
            url: "mem://only".into()
        }
    );
    assert!(only.recv().await.is_some());
}

#[tokio::test]
async fn test_single_node_reconnects_after_drop_without_auto_reconnect() {
    let connector = MemoryConnector::new();
    let mut only = connector.accept("mem://only");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://only");

    let fatal = FatalLog::default();
    connection
        .connect(fatal.options().auto_reconnect(false))
        .await
        .unwrap();

    let mut states = connection.subscribe();
    only.recv().await.unwrap().close("node restarted");
    states
        .wait_for(|s| matches!(s, ConnectionState::Failing { .. }))
        .await
        .unwrap();
    fatal.wait_for_calls(1).await;
    assert!(fatal.last.lock().as_deref().unwrap().contains("node restarted"));
    assert!(connection.submit(GetChainId).is_err());

    // Reconnecting retries the endpoint that dropped.
    connection
        .connect(fatal.options().auto_reconnect(false))
        .await
        .unwrap();
    assert_eq!(
        connection.state(),
        ConnectionState::Connected {
            url: "mem://only".into()
        }
    );
    assert!(only.recv().await.is_some());
    assert_eq!(fatal.calls(), 1);
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_responses_route_by_id_in_any_order() {
    let connector = MemoryConnector::new();
    let mut accepted = connector.accept("mem://node");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://node");
    connection.connect(ConnectOptions::new()).await.unwrap();
    let mut peer = accepted.recv().await.unwrap();

    let chain = connection.submit(GetChainId).unwrap();
    let props = connection.submit(GetDynamicGlobalProperties).unwrap();
    let chain_id = peer.recv_request().await.unwrap()["id"].as_u64().unwrap();
    let props_id = peer.recv_request().await.unwrap()["id"].as_u64().unwrap();
    assert!(props_id > chain_id);

    // Noise first: an unknown id and a server notice.
    peer.reply(9_999, json!("stale"));
    peer.send(json!({"method": "notice", "params": [1, []]}).to_string());

    peer.reply(props_id, node_props());
    peer.reply(chain_id, json!(CHAIN));

    assert_eq!(props.wait().await.unwrap().head_block_number, 0x0123_4567);
    assert_eq!(chain.wait().await.unwrap().to_hex(), CHAIN);
    assert_eq!(connection.metrics().stale_responses_total.get(), 1);
    assert_eq!(connection.pending_count(), 0);
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sign_and_submit_fills_fees_and_block_data() {
    let connector = MemoryConnector::new();
    let mut accepted = connector.accept("mem://node");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://node");
    connection.connect(ConnectOptions::new()).await.unwrap();

    let node = serve(accepted.recv().await.unwrap(), |method, _args| match method {
        "get_dynamic_global_properties" => Ok(node_props()),
        "get_required_fees" => Ok(json!([{"amount": 264174, "asset_id": "1.3.0"}])),
        "broadcast_transaction_synchronous" => Ok(json!({
            "id": "00000000000000000000000000000000000000aa",
            "block_num": 19088743,
            "trx_num": 0,
            "expired": false
        })),
        other => Err(RpcError::new(-32601, format!("unexpected {other}"))),
    });

    let signer = Signer::generate();
    let sequence = BroadcastSequence::new(Arc::clone(&connection)).mode(BroadcastMode::Synchronous);
    let stages = sequence.subscribe();
    let receipt = sequence.sign_and_submit(unfunded_transfer(), &signer).await.unwrap();

    assert_eq!(*stages.borrow(), BroadcastStage::Acknowledged);
    assert_eq!(receipt.confirmation.as_ref().unwrap().block_num, 19_088_743);
    assert_eq!(receipt.transaction_id, receipt.transaction.id());

    let tx = &receipt.transaction;
    assert_eq!(tx.block_data().ref_block_num, 0x4567);
    assert_eq!(tx.block_data().ref_block_prefix, 0xDDCC_BBAA);
    assert_eq!(tx.expiration(), 1_500_000_030);
    assert_eq!(tx.operations()[0].fee().unwrap().amount, 264_174);
    assert_eq!(tx.signers().unwrap(), vec![signer.public_key().clone()]);

    connection.close();
    let calls = node.await.unwrap();
    let methods: Vec<_> = calls.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        methods,
        ["get_dynamic_global_properties", "get_required_fees", "broadcast_transaction_synchronous"]
    );

    let sent = &calls[2].1[0];
    assert_eq!(sent["ref_block_num"], 0x4567);
    assert_eq!(sent["expiration"], "2017-07-14T02:40:30");
    assert_eq!(sent["operations"][0][1]["fee"]["amount"], 264174);
    assert_eq!(sent["signatures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_node_rejection_is_surfaced_verbatim_without_retry() {
    let connector = MemoryConnector::new();
    let mut accepted = connector.accept("mem://node");
    let connection = NodeConnection::new(connector);
    connection.add_endpoint("mem://node");
    connection.connect(ConnectOptions::new()).await.unwrap();

    let rejection = RpcError::new(10, "Assert Exception: insufficient fee")
        .with_data(json!({"code": 10, "name": "assert_exception", "stack": []}));
    let reply = rejection.clone();
    let node = serve(accepted.recv().await.unwrap(), move |_, _| Err(reply.clone()));

    let signer = Signer::generate();
    let mut tx = unfunded_transfer();
    tx.set_fee(0, AssetAmount::new(1, ObjectId::asset(0))).unwrap();
    tx.sign(&signer).unwrap();

    let err = BroadcastSequence::new(Arc::clone(&connection))
        .submit(tx)
        .await
        .unwrap_err();
    assert_eq!(err.node_error(), Some(&rejection));

    connection.close();
    let calls = node.await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "broadcast_transaction");
}

#[tokio::test]
async fn test_broadcast_without_connection_fails_at_first_stage() {
    let connection = NodeConnection::new(MemoryConnector::new());
    let sequence = BroadcastSequence::new(connection);
    let stages = sequence.subscribe();

    let err = sequence
        .sign_and_submit(unfunded_transfer(), &Signer::generate())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("fetching block data failed"));
    assert_eq!(*stages.borrow(), BroadcastStage::Failed);
}
