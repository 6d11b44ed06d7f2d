//! Account registration.

use serde::Serialize;

use super::{check_account, check_fee, encode_fee, OperationError};
use crate::chain::{AccountOptions, AssetAmount, Authority, Extensions, ObjectId};
use crate::codec::{ByteEncode, Encoder};
use crate::config::{GRAPHENE_100_PERCENT, MAX_ACCOUNT_NAME_LENGTH, MIN_ACCOUNT_NAME_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccountOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<AssetAmount>,
    pub registrar: ObjectId,
    pub referrer: ObjectId,
    /// Share of the referral reward, in basis points.
    pub referrer_percent: u16,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub options: AccountOptions,
    pub extensions: Extensions,
}

impl ByteEncode for CreateAccountOperation {
    fn encode(&self, enc: &mut Encoder) {
        encode_fee(&self.fee, enc);
        self.registrar.encode(enc);
        self.referrer.encode(enc);
        enc.put_u16_le(self.referrer_percent);
        enc.put_str(&self.name);
        self.owner.encode(enc);
        self.active.encode(enc);
        self.options.encode(enc);
        self.extensions.encode(enc);
    }
}

/// Dot-separated labels, each starting with a lowercase letter, ending with
/// a letter or digit, and containing only lowercase letters, digits, and `-`.
pub fn validate_account_name(name: &str) -> Result<(), OperationError> {
    let invalid = |reason| OperationError::InvalidAccountName {
        name: name.to_string(),
        reason,
    };

    if name.len() < MIN_ACCOUNT_NAME_LENGTH {
        return Err(invalid("too short"));
    }
    if name.len() > MAX_ACCOUNT_NAME_LENGTH {
        return Err(invalid("too long"));
    }

    for label in name.split('.') {
        let mut chars = label.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            Some(_) => return Err(invalid("labels must start with a lowercase letter")),
            None => return Err(invalid("empty label")),
        }
        if !label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(invalid("only lowercase letters, digits, and '-' are allowed"));
        }
        if label.ends_with('-') {
            return Err(invalid("labels must end with a letter or digit"));
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct CreateAccountOperationBuilder {
    fee: Option<AssetAmount>,
    registrar: Option<ObjectId>,
    referrer: Option<ObjectId>,
    referrer_percent: u16,
    name: Option<String>,
    owner: Option<Authority>,
    active: Option<Authority>,
    options: Option<AccountOptions>,
}

impl CreateAccountOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fee(mut self, fee: AssetAmount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn registrar(mut self, registrar: ObjectId) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Defaults to the registrar.
    pub fn referrer(mut self, referrer: ObjectId) -> Self {
        self.referrer = Some(referrer);
        self
    }

    pub fn referrer_percent(mut self, basis_points: u16) -> Self {
        self.referrer_percent = basis_points;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn owner(mut self, owner: Authority) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn active(mut self, active: Authority) -> Self {
        self.active = Some(active);
        self
    }

    pub fn options(mut self, options: AccountOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(self) -> Result<CreateAccountOperation, OperationError> {
        let registrar = self.registrar.ok_or(OperationError::MissingField("registrar"))?;
        let referrer = self.referrer.unwrap_or(registrar);
        let name = self.name.ok_or(OperationError::MissingField("name"))?;
        let owner = self.owner.ok_or(OperationError::MissingField("owner"))?;
        let active = self.active.ok_or(OperationError::MissingField("active"))?;
        let options = self.options.ok_or(OperationError::MissingField("options"))?;

        check_account(&registrar)?;
        check_account(&referrer)?;
        check_fee(&self.fee)?;
        validate_account_name(&name)?;
        if self.referrer_percent > GRAPHENE_100_PERCENT {
            return Err(OperationError::PercentageOutOfRange(self.referrer_percent));
        }

        Ok(CreateAccountOperation {
            fee: self.fee,
            registrar,
            referrer,
            referrer_percent: self.referrer_percent,
            name,
            owner,
            active,
            options,
            extensions: Extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::public_key::tests::key_from_seed;

    fn builder() -> CreateAccountOperationBuilder {
        let owner = key_from_seed(1);
        let active = key_from_seed(2);
        CreateAccountOperationBuilder::new()
            .registrar(ObjectId::account(28828))
            .name("fingoes-test233")
            .owner(Authority::single_key(owner.clone()))
            .active(Authority::single_key(active))
            .options(AccountOptions::new(owner))
    }

    #[test]
    fn field_order_in_bytes() {
        let op = builder().referrer_percent(5_000).build().unwrap();
        let bytes = op.to_bytes();

        let mut expected = vec![0u8; 9];
        expected.extend_from_slice(&[0x9C, 0xE1, 0x01]);
        expected.extend_from_slice(&[0x9C, 0xE1, 0x01]);
        expected.extend_from_slice(&5_000u16.to_le_bytes());
        expected.push(15);
        expected.extend_from_slice(b"fingoes-test233");
        expected.extend_from_slice(&op.owner.to_bytes());
        expected.extend_from_slice(&op.active.to_bytes());
        expected.extend_from_slice(&op.options.to_bytes());
        expected.push(0x00);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn referrer_defaults_to_registrar() {
        let op = builder().build().unwrap();
        assert_eq!(op.referrer, op.registrar);
    }

    #[test]
    fn rejects_percentage_above_100() {
        assert_eq!(
            builder().referrer_percent(10_001).build(),
            Err(OperationError::PercentageOutOfRange(10_001))
        );
        assert!(builder().referrer_percent(10_000).build().is_ok());
    }

    #[test]
    fn account_names() {
        for good in ["a", "bilthon-7", "cybex.gateway", "x1"] {
            assert!(validate_account_name(good).is_ok(), "{good}");
        }
        let too_long = "a".repeat(MAX_ACCOUNT_NAME_LENGTH + 1);
        for bad in ["", "1abc", "Upper", "trailing-", "double..dot", "under_score", too_long.as_str()] {
            assert!(validate_account_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn json_field_names() {
        let json = serde_json::to_value(builder().build().unwrap()).unwrap();
        for field in ["registrar", "referrer", "referrer_percent", "name", "owner", "active", "options", "extensions"] {
            assert!(json.get(field).is_some(), "{field}");
        }
    }
}
