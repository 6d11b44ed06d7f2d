//! Account options: memo key, voting proxy, and votes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ChainError, Extensions, ObjectId, PublicKey};
use crate::codec::{ByteEncode, Encoder};

/// Account that means "vote for yourself" when used as a voting proxy.
pub const PROXY_TO_SELF_ACCOUNT: ObjectId = ObjectId::account(5);

/// A vote for a committee member, witness, or worker.
///
/// Text form is `type:instance`; binary form is a single `u32` packing the
/// instance in the upper 24 bits and the type in the low 8. Ordering follows
/// the packed value, which is the order the chain expects in vote sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteId {
    vote_type: u8,
    instance: u32,
}

impl VoteId {
    pub const COMMITTEE: u8 = 0;
    pub const WITNESS: u8 = 1;
    pub const WORKER: u8 = 2;

    pub fn new(vote_type: u8, instance: u32) -> Self {
        Self {
            vote_type,
            instance: instance & 0x00FF_FFFF,
        }
    }

    pub fn vote_type(&self) -> u8 {
        self.vote_type
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    pub fn packed(&self) -> u32 {
        (self.instance << 8) | u32::from(self.vote_type)
    }
}

impl Ord for VoteId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.packed().cmp(&other.packed())
    }
}

impl PartialOrd for VoteId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vote_type, self.instance)
    }
}

impl FromStr for VoteId {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ChainError::MalformedObjectId(s.to_string());
        let (kind, instance) = s.split_once(':').ok_or_else(malformed)?;
        let instance: u32 = instance.parse().map_err(|_| malformed())?;
        if instance > 0x00FF_FFFF {
            return Err(malformed());
        }
        Ok(Self::new(kind.parse().map_err(|_| malformed())?, instance))
    }
}

impl ByteEncode for VoteId {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u32_le(self.packed());
    }
}

impl Serialize for VoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// The `options` block of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOptions {
    pub memo_key: PublicKey,
    pub voting_account: ObjectId,
    pub num_witness: u16,
    pub num_committee: u16,
    pub votes: BTreeSet<VoteId>,
    pub extensions: Extensions,
}

impl AccountOptions {
    /// Options for a new account: no votes, voting proxied to self.
    pub fn new(memo_key: PublicKey) -> Self {
        Self {
            memo_key,
            voting_account: PROXY_TO_SELF_ACCOUNT,
            num_witness: 0,
            num_committee: 0,
            votes: BTreeSet::new(),
            extensions: Extensions,
        }
    }

    pub fn with_voting_account(mut self, account: ObjectId) -> Self {
        self.voting_account = account;
        self
    }

    pub fn with_vote(mut self, vote: VoteId) -> Self {
        self.votes.insert(vote);
        self
    }
}

impl ByteEncode for AccountOptions {
    fn encode(&self, enc: &mut Encoder) {
        self.memo_key.encode(enc);
        self.voting_account.encode(enc);
        enc.put_u16_le(self.num_witness);
        enc.put_u16_le(self.num_committee);
        enc.put_varint(self.votes.len() as u64);
        for vote in &self.votes {
            vote.encode(enc);
        }
        self.extensions.encode(enc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::public_key::tests::key_from_seed;

    #[test]
    fn vote_id_packing() {
        let vote: VoteId = "1:129".parse().unwrap();
        assert_eq!(vote.vote_type(), VoteId::WITNESS);
        assert_eq!(vote.packed(), (129 << 8) | 1);
        assert_eq!(hex::encode(vote.to_bytes()), "01810000");
        assert_eq!(vote.to_string(), "1:129");
    }

    #[test]
    fn votes_are_sorted_by_packed_value() {
        let key = key_from_seed(4);
        let options = AccountOptions::new(key.clone())
            .with_vote(VoteId::new(VoteId::WORKER, 1))
            .with_vote(VoteId::new(VoteId::COMMITTEE, 2))
            .with_vote(VoteId::new(VoteId::WITNESS, 1));

        let bytes = options.to_bytes();
        let mut expected = key.compressed().to_vec();
        expected.extend_from_slice(&[0x05, 0x00, 0x00, 0x00, 0x00, 0x03]);
        expected.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]); // 1:1
        expected.extend_from_slice(&[0x02, 0x01, 0x00, 0x00]); // 2:1
        expected.extend_from_slice(&[0x00, 0x02, 0x00, 0x00]); // 0:2
        expected.push(0x00);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn json_shape() {
        let key = key_from_seed(4);
        let json = serde_json::to_value(AccountOptions::new(key.clone())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "memo_key": key.text(),
                "voting_account": "1.2.5",
                "num_witness": 0,
                "num_committee": 0,
                "votes": [],
                "extensions": []
            })
        );
    }

    #[test]
    fn rejects_bad_vote_text() {
        assert!("12".parse::<VoteId>().is_err());
        assert!("1:x".parse::<VoteId>().is_err());
        assert!("1:16777216".parse::<VoteId>().is_err());
    }
}
