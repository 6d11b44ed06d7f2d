//! # Operations
//!
//! One flat enumeration of the actions a transaction can request, keyed by
//! the protocol's numeric operation tag. Each variant owns a plain struct
//! with its fields in declared wire order; the enum adds the tag.
//!
//! ## Wire forms
//!
//! - binary: `varint(tag) || fields... || varint(0)` (the trailing zero is
//!   the operation's empty extension set)
//! - structured: `[tag, { field: value, ... }]`
//!
//! Fees are optional until a fee estimate is filled in. A missing fee
//! encodes as a zero amount of the core asset and is left out of the
//! structured form.
//!
//! Builders in the submodules check the preconditions the encoder assumes
//! (amounts in range, names of legal length, percentages at most 100%).

pub mod account;
pub mod custom;
pub mod limit_order;
pub mod transfer;

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::chain::AssetAmount;
use crate::codec::{ByteEncode, Encoder};

pub use account::{CreateAccountOperation, CreateAccountOperationBuilder};
pub use custom::CustomOperation;
pub use limit_order::{LimitOrderCancelOperation, LimitOrderCreateOperation, LimitOrderCreateOperationBuilder};
pub use transfer::{TransferOperation, TransferOperationBuilder};

/// Rejected builder input. Raised before anything is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("amount {0} exceeds the maximum share supply")]
    AmountOutOfRange(u64),

    #[error("{field} must be positive")]
    ZeroAmount { field: &'static str },

    #[error("invalid account name {name:?}: {reason}")]
    InvalidAccountName { name: String, reason: &'static str },

    #[error("percentage {0} exceeds 100% (10000 basis points)")]
    PercentageOutOfRange(u16),

    #[error("{0} is not the expected object type")]
    WrongObjectType(String),

    #[error("cannot trade an asset against itself: {0}")]
    SameAsset(String),
}

// ---------------------------------------------------------------------------
// OperationType
// ---------------------------------------------------------------------------

/// Position in the protocol's operation enumeration. The discriminants are
/// the wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationType {
    Transfer = 0,
    LimitOrderCreate = 1,
    LimitOrderCancel = 2,
    AccountCreate = 5,
    Custom = 35,
}

impl OperationType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Transfer),
            1 => Some(Self::LimitOrderCreate),
            2 => Some(Self::LimitOrderCancel),
            5 => Some(Self::AccountCreate),
            35 => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transfer => "transfer",
            Self::LimitOrderCreate => "limit_order_create",
            Self::LimitOrderCancel => "limit_order_cancel",
            Self::AccountCreate => "account_create",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transfer(TransferOperation),
    LimitOrderCreate(LimitOrderCreateOperation),
    LimitOrderCancel(LimitOrderCancelOperation),
    AccountCreate(CreateAccountOperation),
    Custom(CustomOperation),
}

impl Operation {
    pub fn op_type(&self) -> OperationType {
        match self {
            Self::Transfer(_) => OperationType::Transfer,
            Self::LimitOrderCreate(_) => OperationType::LimitOrderCreate,
            Self::LimitOrderCancel(_) => OperationType::LimitOrderCancel,
            Self::AccountCreate(_) => OperationType::AccountCreate,
            Self::Custom(_) => OperationType::Custom,
        }
    }

    pub fn tag(&self) -> u8 {
        self.op_type().tag()
    }

    pub fn fee(&self) -> Option<&AssetAmount> {
        match self {
            Self::Transfer(op) => op.fee.as_ref(),
            Self::LimitOrderCreate(op) => op.fee.as_ref(),
            Self::LimitOrderCancel(op) => op.fee.as_ref(),
            Self::AccountCreate(op) => op.fee.as_ref(),
            Self::Custom(op) => op.fee.as_ref(),
        }
    }

    pub fn set_fee(&mut self, fee: AssetAmount) {
        let slot = match self {
            Self::Transfer(op) => &mut op.fee,
            Self::LimitOrderCreate(op) => &mut op.fee,
            Self::LimitOrderCancel(op) => &mut op.fee,
            Self::AccountCreate(op) => &mut op.fee,
            Self::Custom(op) => &mut op.fee,
        };
        *slot = Some(fee);
    }

    /// Structured form `[tag, {fields}]` accepted by nodes.
    pub fn to_wire_object(&self) -> Value {
        let body = match self {
            Self::Transfer(op) => serde_json::to_value(op),
            Self::LimitOrderCreate(op) => serde_json::to_value(op),
            Self::LimitOrderCancel(op) => serde_json::to_value(op),
            Self::AccountCreate(op) => serde_json::to_value(op),
            Self::Custom(op) => serde_json::to_value(op),
        };
        // Operation fields are plain data with string-keyed maps only.
        let body = body.unwrap_or(Value::Null);
        Value::Array(vec![Value::from(self.tag()), body])
    }

    fn encode_body(&self, enc: &mut Encoder) {
        match self {
            Self::Transfer(op) => op.encode(enc),
            Self::LimitOrderCreate(op) => op.encode(enc),
            Self::LimitOrderCancel(op) => op.encode(enc),
            Self::AccountCreate(op) => op.encode(enc),
            Self::Custom(op) => op.encode(enc),
        }
    }
}

/// `varint(tag) || body`.
impl ByteEncode for Operation {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_varint(u64::from(self.tag()));
        self.encode_body(enc);
    }
}

impl Serialize for Operation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire_object().serialize(serializer)
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation! {
    Transfer => TransferOperation,
    LimitOrderCreate => LimitOrderCreateOperation,
    LimitOrderCancel => LimitOrderCancelOperation,
    AccountCreate => CreateAccountOperation,
    Custom => CustomOperation,
}

/// Binary form of an optional fee.
pub(crate) fn encode_fee(fee: &Option<AssetAmount>, enc: &mut Encoder) {
    match fee {
        Some(amount) => amount.encode(enc),
        None => AssetAmount::zero_core().encode(enc),
    }
}

pub(crate) fn check_amount(amount: &AssetAmount, field: &'static str) -> Result<(), OperationError> {
    if !amount.is_in_range() {
        return Err(OperationError::AmountOutOfRange(amount.amount));
    }
    if amount.is_zero() {
        return Err(OperationError::ZeroAmount { field });
    }
    Ok(())
}

pub(crate) fn check_fee(fee: &Option<AssetAmount>) -> Result<(), OperationError> {
    match fee {
        Some(fee) if !fee.is_in_range() => Err(OperationError::AmountOutOfRange(fee.amount)),
        _ => Ok(()),
    }
}

pub(crate) fn check_account(id: &crate::chain::ObjectId) -> Result<(), OperationError> {
    if id.is_account() {
        Ok(())
    } else {
        Err(OperationError::WrongObjectType(id.to_string()))
    }
}
