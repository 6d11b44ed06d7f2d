//! Weighted permission sets.
//!
//! An authority is satisfied when the weights of the keys and accounts that
//! signed add up to at least `weight_threshold`. Nodes recompute the digest of
//! any transaction carrying an authority, so the order of the key and account
//! entries is part of the wire contract: accounts ascend by object instance,
//! keys ascend by their 33 compressed bytes. Both maps are `BTreeMap`s, which
//! makes the order a property of the value rather than of insertion history.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{ObjectId, PublicKey};
use crate::codec::{ByteEncode, Encoder};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Authority {
    weight_threshold: u32,
    account_auths: BTreeMap<ObjectId, u16>,
    key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Self {
            weight_threshold,
            ..Default::default()
        }
    }

    /// Build from arbitrary key and account collections. Later duplicates
    /// replace earlier weights.
    pub fn from_parts(
        weight_threshold: u32,
        keys: impl IntoIterator<Item = (PublicKey, u16)>,
        accounts: impl IntoIterator<Item = (ObjectId, u16)>,
    ) -> Self {
        Self {
            weight_threshold,
            key_auths: keys.into_iter().collect(),
            account_auths: accounts.into_iter().collect(),
        }
    }

    /// Single-key authority with threshold 1 and weight 1, the shape every
    /// freshly registered account starts with.
    pub fn single_key(key: PublicKey) -> Self {
        Self::new(1).with_key(key, 1)
    }

    pub fn with_key(mut self, key: PublicKey, weight: u16) -> Self {
        self.key_auths.insert(key, weight);
        self
    }

    pub fn with_account(mut self, account: ObjectId, weight: u16) -> Self {
        self.account_auths.insert(account, weight);
        self
    }

    pub fn weight_threshold(&self) -> u32 {
        self.weight_threshold
    }

    pub fn key_auths(&self) -> impl Iterator<Item = (&PublicKey, u16)> {
        self.key_auths.iter().map(|(k, w)| (k, *w))
    }

    pub fn account_auths(&self) -> impl Iterator<Item = (&ObjectId, u16)> {
        self.account_auths.iter().map(|(a, w)| (a, *w))
    }

    /// Sum of every weight in the authority. An authority whose total weight
    /// is below its threshold can never be satisfied.
    pub fn total_weight(&self) -> u64 {
        let keys: u64 = self.key_auths.values().map(|w| u64::from(*w)).sum();
        let accounts: u64 = self.account_auths.values().map(|w| u64::from(*w)).sum();
        keys + accounts
    }

    pub fn is_satisfiable(&self) -> bool {
        self.total_weight() >= u64::from(self.weight_threshold)
    }
}

impl ByteEncode for Authority {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u32_le(self.weight_threshold);

        enc.put_varint(self.account_auths.len() as u64);
        for (account, weight) in &self.account_auths {
            account.encode(enc);
            enc.put_u16_le(*weight);
        }

        enc.put_varint(self.key_auths.len() as u64);
        for (key, weight) in &self.key_auths {
            key.encode(enc);
            enc.put_u16_le(*weight);
        }

        // address_auths: legacy, always empty
        enc.put_varint(0);
    }
}

impl Serialize for Authority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let accounts: Vec<(&ObjectId, &u16)> = self.account_auths.iter().collect();
        let keys: Vec<(&PublicKey, &u16)> = self.key_auths.iter().collect();
        let addresses: [(); 0] = [];

        let mut state = serializer.serialize_struct("Authority", 4)?;
        state.serialize_field("weight_threshold", &self.weight_threshold)?;
        state.serialize_field("account_auths", &accounts)?;
        state.serialize_field("key_auths", &keys)?;
        state.serialize_field("address_auths", &addresses)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::public_key::tests::key_from_seed;

    #[test]
    fn insertion_order_does_not_change_bytes() {
        let (k1, k2, k3) = (key_from_seed(1), key_from_seed(2), key_from_seed(3));

        let forward = Authority::new(2)
            .with_key(k1.clone(), 1)
            .with_key(k2.clone(), 1)
            .with_key(k3.clone(), 1)
            .with_account(ObjectId::account(300), 1)
            .with_account(ObjectId::account(5), 1);

        let backward = Authority::from_parts(
            2,
            vec![(k3, 1), (k2, 1), (k1, 1)],
            vec![(ObjectId::account(5), 1), (ObjectId::account(300), 1)],
        );

        assert_eq!(forward.to_bytes(), backward.to_bytes());
        assert_eq!(
            serde_json::to_value(&forward).unwrap(),
            serde_json::to_value(&backward).unwrap()
        );
    }

    #[test]
    fn accounts_sort_numerically_not_by_varint_bytes() {
        // varint(128) = 80 01 sorts before varint(5) = 05 bytewise; the chain
        // orders by instance.
        let auth = Authority::new(1)
            .with_account(ObjectId::account(128), 1)
            .with_account(ObjectId::account(5), 1);
        let bytes = auth.to_bytes();
        assert_eq!(
            hex::encode(bytes),
            "01000000\
             02\
             05\
             0100\
             8001\
             0100\
             00\
             00"
        );
    }

    #[test]
    fn single_key_layout() {
        let key = key_from_seed(9);
        let bytes = Authority::single_key(key.clone()).to_bytes();
        let mut expected = vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
        expected.extend_from_slice(&key.compressed());
        expected.extend_from_slice(&[0x01, 0x00, 0x00]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(Authority::new(1).with_account(ObjectId::account(5), 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "weight_threshold": 1,
                "account_auths": [["1.2.5", 1]],
                "key_auths": [],
                "address_auths": []
            })
        );
    }

    #[test]
    fn satisfiability() {
        let auth = Authority::new(3).with_key(key_from_seed(1), 1).with_key(key_from_seed(2), 1);
        assert!(!auth.is_satisfiable());
        assert!(auth.with_account(ObjectId::account(7), 1).is_satisfiable());
    }
}
