//! # JSON-RPC Wire Types
//!
//! Graphene nodes speak JSON-RPC 2.0 over a WebSocket, with every call routed
//! through the single method `call` whose params name the API:
//!
//! ```text
//! {"jsonrpc":"2.0","id":7,"method":"call","params":["database","get_chain_id",[]]}
//! ```
//!
//! Responses echo the id and carry either `result` or `error`. Nodes also
//! push notices (subscription callbacks) without an id; those are surfaced as
//! [`InboundMessage::Notice`] and never matched against pending requests.
//!
//! ## API Index
//!
//! | Api                | Wire name           |
//! |--------------------|---------------------|
//! | `Database`         | `database`          |
//! | `History`          | `history`           |
//! | `NetworkBroadcast` | `network_broadcast` |
//! | `Asset`            | `asset`             |
//! | `Login`            | `login`             |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ASSET_API, DATABASE_API, HISTORY_API, LOGIN_API, NETWORK_BROADCAST_API, RPC_CALL_METHOD};

// ---------------------------------------------------------------------------
// Api
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Api {
    Database,
    History,
    NetworkBroadcast,
    Asset,
    Login,
}

impl Api {
    pub fn name(self) -> &'static str {
        match self {
            Self::Database => DATABASE_API,
            Self::History => HISTORY_API,
            Self::NetworkBroadcast => NETWORK_BROADCAST_API,
            Self::Asset => ASSET_API,
            Self::Login => LOGIN_API,
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always "2.0".
    pub jsonrpc: String,
    pub id: u64,
    /// Always `call`; the real method travels in `params`.
    pub method: String,
    /// `[api, method, [args...]]`
    pub params: Value,
}

impl RpcRequest {
    pub fn call(id: u64, api: Api, method: &str, args: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: RPC_CALL_METHOD.to_string(),
            params: Value::Array(vec![Value::from(api.name()), Value::from(method), Value::Array(args)]),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of strings, integers, and JSON values always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Raw response envelope as it comes off the wire.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Terminal outcome of the request with this id.
    Response { id: u64, outcome: Result<Value, RpcError> },
    /// Server push without an id.
    Notice { method: String, params: Value },
}

/// Classify a text frame. Frames that are not JSON, or that carry an id but
/// neither `result` nor `error`, are reported as errors.
pub fn parse_inbound(text: &str) -> Result<InboundMessage, InboundError> {
    let raw: RawEnvelope = serde_json::from_str(text).map_err(|e| InboundError::Json(e.to_string()))?;

    let id = raw.id.as_ref().and_then(request_id);
    match (id, raw.error, raw.result) {
        (Some(id), Some(error), _) => Ok(InboundMessage::Response { id, outcome: Err(error) }),
        (Some(id), None, Some(result)) => Ok(InboundMessage::Response { id, outcome: Ok(result) }),
        (Some(id), None, None) => Ok(InboundMessage::Response {
            id,
            // `"result": null` lands here too; it is a valid empty result.
            outcome: Ok(Value::Null),
        }),
        (None, _, _) => match raw.method {
            Some(method) => Ok(InboundMessage::Notice {
                method,
                params: raw.params.unwrap_or(Value::Null),
            }),
            None => Err(InboundError::Unroutable(text.chars().take(120).collect())),
        },
    }
}

/// Ids are issued as integers, but some nodes echo them as strings.
fn request_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundError {
    #[error("inbound frame is not valid JSON: {0}")]
    Json(String),

    #[error("inbound frame has neither an id nor a method: {0}")]
    Unroutable(String),
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// An error object reported by the node. Passed to callers untouched:
/// `message` and `data` are never reinterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("node error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
