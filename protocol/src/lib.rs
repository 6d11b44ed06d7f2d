// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Graphene Protocol: Client Library
//!
//! Builds transactions for Graphene-family chains byte for byte the way the
//! chain's consensus code re-serializes them, signs them with canonical
//! secp256k1 signatures, and delivers them to whichever node in a candidate
//! list is answering.
//!
//! ## Architecture
//!
//! - **codec**: varints, fixed-width integers, length-prefixed fields.
//! - **chain**: value types such as object ids, amounts, keys, authorities.
//! - **operations**: one variant per supported operation, plus builders.
//! - **transaction**: the signable bundle, its digest and id.
//! - **crypto**: SHA-256 and the secp256k1 signer.
//! - **api**: JSON-RPC envelope and one handler per remote call.
//! - **network**: node failover, request routing, broadcast sequencing.
//! - **config**: protocol constants and client configuration.
//!
//! ## Quick tour
//!
//! ```no_run
//! use graphene_protocol::chain::{AssetAmount, ObjectId};
//! use graphene_protocol::config::BITSHARES_MAINNET_CHAIN_ID;
//! use graphene_protocol::crypto::Signer;
//! use graphene_protocol::network::{BroadcastSequence, ConnectOptions, NodeConnection, WebSocketConnector};
//! use graphene_protocol::operations::TransferOperationBuilder;
//! use graphene_protocol::transaction::TransactionBuilder;
//!
//! # async fn demo(signer: Signer) -> anyhow::Result<()> {
//! let connection = NodeConnection::new(WebSocketConnector);
//! connection.add_endpoints(["wss://node-a.example", "wss://node-b.example"]);
//! connection.connect(ConnectOptions::new()).await?;
//!
//! let transfer = TransferOperationBuilder::new()
//!     .from(ObjectId::account(18))
//!     .to(ObjectId::account(28828))
//!     .amount(AssetAmount::new(1, ObjectId::asset(0)))
//!     .build()?;
//! let tx = TransactionBuilder::new(BITSHARES_MAINNET_CHAIN_ID.parse()?)
//!     .operation(transfer)
//!     .build();
//!
//! let receipt = BroadcastSequence::new(connection).sign_and_submit(tx, &signer).await?;
//! println!("{}", receipt.transaction_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod chain;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod network;
pub mod operations;
pub mod transaction;
