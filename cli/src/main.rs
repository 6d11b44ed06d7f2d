// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Graphene CLI
//!
//! Entry point for the `graphene-cli` binary. Parses arguments, layers the
//! configuration (file, then environment and flags), connects to the first
//! answering node, and runs one subcommand:
//!
//! - `chain-id`: print the node's chain id
//! - `account`: look up an account by name
//! - `balances`: print balances of an account
//! - `orders`: print open limit orders in a market
//! - `transfer`: build, sign, and broadcast a transfer
//! - `version`: print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use graphene_protocol::api::{GetAccountBalances, GetAccountByName, GetChainId, GetLimitOrders};
use graphene_protocol::chain::{AssetAmount, ChainId};
use graphene_protocol::config::ClientConfig;
use graphene_protocol::crypto::Signer;
use graphene_protocol::network::{BroadcastMode, BroadcastSequence, ConnectOptions, NodeConnection};
use graphene_protocol::operations::TransferOperationBuilder;
use graphene_protocol::transaction::TransactionBuilder;

use cli::{Commands, GrapheneCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = GrapheneCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    logging::init_logging("graphene_cli=info,graphene_protocol=info", cli.log_format);

    let config = load_config(&cli)?;
    let connection = NodeConnection::from_config(&config);
    connection
        .connect(ConnectOptions::from_config(&config))
        .await
        .context("no node accepted the connection")?;

    let result = run(cli.command, &connection, &config).await;
    connection.close();
    result
}

/// Config file first, then flags and environment on top.
fn load_config(cli: &GrapheneCli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if !cli.nodes.is_empty() {
        config.nodes = cli.nodes.clone();
    }
    if cli.no_reconnect {
        config.auto_reconnect = false;
    }
    config.validate().context("invalid configuration")?;

    if config.nodes.is_empty() {
        bail!("no nodes configured; pass --node or set `nodes` in the config file");
    }
    tracing::debug!(nodes = ?config.nodes, auto_reconnect = config.auto_reconnect, "configuration loaded");
    Ok(config)
}

async fn run(command: Commands, connection: &Arc<NodeConnection>, config: &ClientConfig) -> Result<()> {
    match command {
        Commands::ChainId => {
            let chain_id = connection.dispatch(GetChainId).await?;
            println!("{chain_id}");
        }
        Commands::Account(args) => {
            let account = connection
                .dispatch(GetAccountByName { name: args.name.clone() })
                .await?
                .with_context(|| format!("account {} not found", args.name))?;
            println!("{} {}", account.id, account.name);
        }
        Commands::Balances(args) => {
            let balances = connection
                .dispatch(GetAccountBalances {
                    account: args.account,
                    assets: args.assets,
                })
                .await?;
            for balance in balances {
                println!("{balance}");
            }
        }
        Commands::Orders(args) => {
            let orders = connection
                .dispatch(GetLimitOrders {
                    base: args.base,
                    quote: args.quote,
                    limit: args.limit,
                })
                .await?;
            for order in orders {
                println!(
                    "{} seller={} for_sale={} price={} / {}",
                    order.id, order.seller, order.for_sale, order.sell_price.base, order.sell_price.quote
                );
            }
        }
        Commands::Transfer(args) => transfer(args, connection, config).await?,
        Commands::Version => print_version(),
    }
    Ok(())
}

async fn transfer(args: cli::TransferArgs, connection: &Arc<NodeConnection>, config: &ClientConfig) -> Result<()> {
    let signer = Signer::from_hex(&args.key_hex).context("invalid --key-hex")?;
    let chain_id: ChainId = config.chain_id.parse()?;

    // A signature for the wrong chain would only be rejected after broadcast.
    let node_chain = connection.dispatch(GetChainId).await?;
    if node_chain != chain_id {
        bail!("node is on chain {node_chain}, configuration expects {chain_id}");
    }

    let operation = TransferOperationBuilder::new()
        .from(args.from)
        .to(args.to)
        .amount(AssetAmount::new(args.amount, args.asset))
        .build()?;
    let transaction = TransactionBuilder::new(chain_id).operation(operation).build();

    let mode = if args.wait {
        BroadcastMode::Synchronous
    } else {
        BroadcastMode::Asynchronous
    };
    let receipt = BroadcastSequence::from_config(Arc::clone(connection), config)
        .fee_asset(args.fee_asset.unwrap_or(config.fee_asset))
        .mode(mode)
        .sign_and_submit(transaction, &signer)
        .await?;

    println!("{}", receipt.transaction_id);
    if let Some(confirmation) = receipt.confirmation {
        println!("included in block {} (trx {})", confirmation.block_num, confirmation.trx_num);
    }
    Ok(())
}

fn print_version() {
    println!("graphene-cli {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
