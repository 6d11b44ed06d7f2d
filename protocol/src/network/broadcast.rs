//! # Broadcast Sequence
//!
//! Drives one transaction from "operations assembled" to "node acknowledged":
//!
//! 1. fetch dynamic global properties and pin the transaction to the head
//!    block with an expiration window,
//! 2. quote fees for every operation that has none,
//! 3. sign,
//! 4. submit.
//!
//! Nothing here retries. A broadcast that may or may not have reached a node
//! cannot be resent safely, so the first failure ends the sequence and is
//! returned as-is. Node rejections stay reachable through
//! [`BroadcastError::node_error`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::connection::NodeConnection;
use super::{BroadcastError, RequestError};
use crate::api::{
    BroadcastConfirmation, BroadcastTransaction, BroadcastTransactionSynchronous, GetDynamicGlobalProperties,
    GetRequiredFees, RequestHandler,
};
use crate::chain::ObjectId;
use crate::config::{self, ClientConfig};
use crate::crypto::Signer;
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastStage {
    Pending,
    FetchingBlockData,
    FetchingFees,
    Signing,
    Submitting,
    Acknowledged,
    Failed,
}

impl fmt::Display for BroadcastStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::FetchingBlockData => "fetching block data",
            Self::FetchingFees => "fetching fees",
            Self::Signing => "signing",
            Self::Submitting => "submitting",
            Self::Acknowledged => "acknowledged",
            Self::Failed => "failed",
        })
    }
}

/// Which broadcast call to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastMode {
    /// `broadcast_transaction`: the node validates and relays, then replies.
    #[default]
    Asynchronous,
    /// `broadcast_transaction_synchronous`: the reply waits for inclusion.
    Synchronous,
}

#[derive(Debug, Clone)]
pub struct BroadcastReceipt {
    pub transaction: Transaction,
    pub transaction_id: String,
    /// Present in synchronous mode.
    pub confirmation: Option<BroadcastConfirmation>,
}

/// One broadcast. Consumed by [`submit`](Self::submit) or
/// [`sign_and_submit`](Self::sign_and_submit).
pub struct BroadcastSequence {
    connection: Arc<NodeConnection>,
    mode: BroadcastMode,
    expiration: Duration,
    fee_asset: ObjectId,
    stage: watch::Sender<BroadcastStage>,
}

impl BroadcastSequence {
    pub fn new(connection: Arc<NodeConnection>) -> Self {
        let (stage, _) = watch::channel(BroadcastStage::Pending);
        Self {
            connection,
            mode: BroadcastMode::default(),
            expiration: config::DEFAULT_EXPIRATION,
            fee_asset: config::CORE_ASSET,
            stage,
        }
    }

    pub fn from_config(connection: Arc<NodeConnection>, config: &ClientConfig) -> Self {
        Self::new(connection)
            .expiration(config.expiration())
            .fee_asset(config.fee_asset)
    }

    pub fn mode(mut self, mode: BroadcastMode) -> Self {
        self.mode = mode;
        self
    }

    /// Window added to the head block time.
    pub fn expiration(mut self, window: Duration) -> Self {
        self.expiration = window;
        self
    }

    pub fn fee_asset(mut self, asset: ObjectId) -> Self {
        self.fee_asset = asset;
        self
    }

    pub fn stage(&self) -> BroadcastStage {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BroadcastStage> {
        self.stage.subscribe()
    }

    /// Submit an already signed transaction.
    pub async fn submit(self, transaction: Transaction) -> Result<BroadcastReceipt, BroadcastError> {
        if !transaction.is_signed() {
            self.enter(BroadcastStage::Failed);
            return Err(BroadcastError::Unsigned);
        }
        self.finish(self.broadcast(transaction).await)
    }

    /// Fill block data and missing fees, sign with `signer`, and submit.
    pub async fn sign_and_submit(
        self,
        transaction: Transaction,
        signer: &Signer,
    ) -> Result<BroadcastReceipt, BroadcastError> {
        let result = self.prepare(transaction, signer).await;
        let result = match result {
            Ok(transaction) => self.broadcast(transaction).await,
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    async fn prepare(&self, mut transaction: Transaction, signer: &Signer) -> Result<Transaction, BroadcastError> {
        self.enter(BroadcastStage::FetchingBlockData);
        let props = self.call(BroadcastStage::FetchingBlockData, GetDynamicGlobalProperties).await?;
        let block_data = props.block_data(self.expiration)?;
        debug!(
            ref_block_num = block_data.ref_block_num,
            expiration = %block_data.expiration_string(),
            "pinned to head block"
        );
        transaction.set_block_data(block_data)?;

        let missing = transaction.operations_without_fee();
        if !missing.is_empty() {
            self.enter(BroadcastStage::FetchingFees);
            let operations = missing.iter().map(|&i| transaction.operations()[i].clone()).collect();
            let fees = self
                .call(
                    BroadcastStage::FetchingFees,
                    GetRequiredFees {
                        operations,
                        asset: self.fee_asset,
                    },
                )
                .await?;
            if fees.len() != missing.len() {
                return Err(BroadcastError::FeeCountMismatch {
                    requested: missing.len(),
                    returned: fees.len(),
                });
            }
            for (index, fee) in missing.into_iter().zip(fees) {
                transaction.set_fee(index, fee.amount())?;
            }
        }

        self.enter(BroadcastStage::Signing);
        transaction.sign(signer)?;
        Ok(transaction)
    }

    async fn broadcast(&self, transaction: Transaction) -> Result<BroadcastReceipt, BroadcastError> {
        self.enter(BroadcastStage::Submitting);
        let transaction_id = transaction.id();
        info!(tx_id = %transaction_id, mode = ?self.mode, "broadcasting transaction");

        let confirmation = match self.mode {
            BroadcastMode::Asynchronous => {
                self.call(BroadcastStage::Submitting, BroadcastTransaction::new(&transaction))
                    .await?;
                None
            }
            BroadcastMode::Synchronous => Some(
                self.call(
                    BroadcastStage::Submitting,
                    BroadcastTransactionSynchronous::new(&transaction),
                )
                .await?,
            ),
        };

        Ok(BroadcastReceipt {
            transaction,
            transaction_id,
            confirmation,
        })
    }

    async fn call<H: RequestHandler>(&self, stage: BroadcastStage, handler: H) -> Result<H::Output, BroadcastError> {
        self.connection
            .dispatch(handler)
            .await
            .map_err(|source: RequestError| BroadcastError::Request { stage, source })
    }

    fn finish(&self, result: Result<BroadcastReceipt, BroadcastError>) -> Result<BroadcastReceipt, BroadcastError> {
        match &result {
            Ok(receipt) => {
                self.enter(BroadcastStage::Acknowledged);
                info!(
                    tx_id = %receipt.transaction_id,
                    block_num = receipt.confirmation.as_ref().map(|c| c.block_num),
                    "broadcast acknowledged"
                );
            }
            Err(e) => {
                let stage = self.stage();
                self.enter(BroadcastStage::Failed);
                warn!(stage = %stage, error = %e, "broadcast failed");
            }
        }
        result
    }

    fn enter(&self, stage: BroadcastStage) {
        self.stage.send_replace(stage);
    }
}
