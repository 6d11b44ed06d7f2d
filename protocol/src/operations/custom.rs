//! Opaque application data recorded on chain.
//!
//! Unlike the other operations, `custom` has no extension set: the chain
//! defines it as fee, payer, required_auths, id, data.

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use super::encode_fee;
use crate::chain::{AssetAmount, ObjectId};
use crate::codec::{ByteEncode, Encoder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<AssetAmount>,
    pub payer: ObjectId,
    /// Accounts whose active authority must also sign. Kept sorted.
    pub required_auths: BTreeSet<ObjectId>,
    /// Application-chosen discriminator.
    pub id: u16,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl CustomOperation {
    pub fn new(payer: ObjectId, id: u16, data: Vec<u8>) -> Self {
        Self {
            fee: None,
            payer,
            required_auths: BTreeSet::from([payer]),
            id,
            data,
        }
    }

    pub fn with_fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_required_auth(mut self, account: ObjectId) -> Self {
        self.required_auths.insert(account);
        self
    }
}

impl ByteEncode for CustomOperation {
    fn encode(&self, enc: &mut Encoder) {
        encode_fee(&self.fee, enc);
        self.payer.encode(enc);
        enc.put_varint(self.required_auths.len() as u64);
        for account in &self.required_auths {
            account.encode(enc);
        }
        enc.put_u16_le(self.id);
        enc.put_bytes(&self.data);
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
