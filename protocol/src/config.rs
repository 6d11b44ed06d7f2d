//! # Protocol Configuration & Constants
//!
//! Protocol constants the encoder and signer depend on, plus the client-side
//! configuration file (`ClientConfig`) the binary and embedders load.
//!
//! Nothing in the first half of this file is negotiable: nodes recompute
//! digests with the same widths and the same core asset.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::chain::ObjectId;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// SHA-256 output width. The signer refuses any other digest length.
pub const DIGEST_LENGTH: usize = 32;

/// Wire signature: 1 header byte plus compact `r || s`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Compact `r || s` without the header byte.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Header offset for a compressed-key recoverable signature (27 + 4).
pub const SIGNATURE_HEADER_BASE: u8 = 31;

/// Transaction ids are the leading bytes of SHA-256 over the unsigned bytes.
pub const TRANSACTION_ID_LENGTH: usize = 20;

/// Upper bound on nonce attempts when searching for a canonical signature.
/// Roughly one in four signatures is canonical, so this is never reached
/// with a valid key.
pub const MAX_CANONICAL_ATTEMPTS: u32 = 256;

// ---------------------------------------------------------------------------
// Chain Parameters
// ---------------------------------------------------------------------------

/// Chain id of the BitShares main network.
pub const BITSHARES_MAINNET_CHAIN_ID: &str = "4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8";

/// The core asset, `1.3.0`. Fees default to it.
pub const CORE_ASSET: ObjectId = ObjectId::asset(0);

/// Largest amount the chain's share type admits (10^15).
pub const MAX_SHARE_SUPPLY: u64 = 1_000_000_000_000_000;

/// 100% in basis points.
pub const GRAPHENE_100_PERCENT: u16 = 10_000;

pub const MIN_ACCOUNT_NAME_LENGTH: usize = 1;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 63;

/// How far ahead of the head block a new transaction expires.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(30);

/// Nodes refuse expirations further out than one day.
pub const MAX_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// API Names
// ---------------------------------------------------------------------------

pub const DATABASE_API: &str = "database";
pub const HISTORY_API: &str = "history";
pub const NETWORK_BROADCAST_API: &str = "network_broadcast";
pub const ASSET_API: &str = "asset";
pub const LOGIN_API: &str = "login";

/// JSON-RPC method that wraps every API call.
pub const RPC_CALL_METHOD: &str = "call";

// ---------------------------------------------------------------------------
// Client Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Client settings, usually read from a TOML file.
///
/// ```toml
/// nodes = ["wss://node.example.org/ws", "wss://backup.example.org/ws"]
/// chain_id = "4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8"
/// auto_reconnect = true
/// expiration_secs = 30
/// fee_asset = "1.3.0"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Candidate endpoints, tried in order.
    pub nodes: Vec<String>,
    pub chain_id: String,
    pub auto_reconnect: bool,
    pub username: String,
    pub password: String,
    pub expiration_secs: u64,
    pub fee_asset: ObjectId,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            chain_id: BITSHARES_MAINNET_CHAIN_ID.to_string(),
            auto_reconnect: true,
            username: String::new(),
            password: String::new(),
            expiration_secs: DEFAULT_EXPIRATION.as_secs(),
            fee_asset: CORE_ASSET,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::chain::ChainId::from_hex(&self.chain_id).map_err(|e| ConfigError::InvalidValue {
            field: "chain_id",
            reason: e.to_string(),
        })?;
        if self.expiration_secs == 0 || self.expiration_secs > MAX_EXPIRATION.as_secs() {
            return Err(ConfigError::InvalidValue {
                field: "expiration_secs",
                reason: format!("must be between 1 and {}", MAX_EXPIRATION.as_secs()),
            });
        }
        if !self.fee_asset.is_asset() {
            return Err(ConfigError::InvalidValue {
                field: "fee_asset",
                reason: format!("{} is not an asset id", self.fee_asset),
            });
        }
        Ok(())
    }

    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    /// Login credentials, unless both parts are empty.
    pub fn credentials(&self) -> Option<(String, String)> {
        if self.username.is_empty() && self.password.is_empty() {
            None
        } else {
            Some((self.username.clone(), self.password.clone()))
        }
    }
}
