//! # Extended Data
//!
//! The parameter/metadata bag attached to a financial transaction.
//!
//! Callers put gateway inputs in here (token, receipt email, ...) and the
//! plugins record gateway-assigned identifiers (charge id, client secret, ...)
//! for later reuse. Known keys are typed fields; anything else is kept in
//! `extra` and passed through untouched.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Typed extended data with a residual open map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedData {
    // ---- gateway inputs ----
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Card token (tok_...) or source id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(
        rename = "paymentMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,

    #[serde(rename = "returnUrl", default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,

    /// Connected account receiving the funds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(
        rename = "receiptEmail",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub receipt_email: Option<String>,

    #[serde(
        rename = "statementDescriptor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub statement_descriptor: Option<String>,

    /// Application fee in major currency units
    #[serde(
        rename = "applicationFee",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub application_fee: Option<Decimal>,

    #[serde(
        rename = "stripeVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stripe_version: Option<String>,

    #[serde(
        rename = "connectedStripeAccountHeader",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_stripe_account_header: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,

    #[serde(
        rename = "refundApplicationFee",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refund_application_fee: Option<bool>,

    // ---- recorded by the plugins ----
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_id: Option<String>,

    /// Charge id recorded by the legacy charge flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_charge_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_transaction_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_fee_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Raw refund response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_response: Option<Value>,

    /// Unrecognised keys, passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! overwrite_present {
    ($target:ident, $source:ident, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl ExtendedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw key/value map, validating the known keys.
    ///
    /// A known key holding `null` is rejected: absent and null cannot be told
    /// apart once parsed. Unknown keys keep their `null`.
    pub fn from_map(map: Map<String, Value>) -> PaymentResult<Self> {
        let null_keys: Vec<String> = map
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.clone())
            .collect();

        let data: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| PaymentError::InvalidRequest(format!("Invalid extended data: {}", e)))?;

        match null_keys.iter().find(|key| !data.extra.contains_key(*key)) {
            Some(key) => Err(PaymentError::InvalidRequest(format!(
                "Invalid extended data: \"{}\" cannot be null, remove it instead",
                key
            ))),
            None => Ok(data),
        }
    }

    /// Raw key/value view. Absent fields are not present as keys.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.to_map().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_map().remove(key)
    }

    /// Set a key. A value of the wrong type for a known key, or `null`, is
    /// rejected and leaves the bag unchanged.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> PaymentResult<()> {
        let mut map = self.to_map();
        map.insert(key.into(), value);
        *self = Self::from_map(map)?;
        Ok(())
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> PaymentResult<Option<Value>> {
        let mut map = self.to_map();
        let previous = map.remove(key);
        *self = Self::from_map(map)?;
        Ok(previous)
    }

    /// Overwrite with every field present in `other`.
    pub fn merge(&mut self, other: ExtendedData) {
        overwrite_present!(
            self,
            other,
            description,
            token,
            payment_method,
            confirm,
            return_url,
            destination,
            receipt_email,
            statement_descriptor,
            application_fee,
            stripe_version,
            connected_stripe_account_header,
            metadata,
            refund_application_fee,
            payment_intent_id,
            charge_id,
            stripe_charge_id,
            balance_transaction_id,
            application_fee_id,
            client_secret,
            stripe_response,
        );
        self.extra.extend(other.extra);
    }

    pub fn len(&self) -> usize {
        self.to_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Builders, mostly for callers assembling a purchase

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_receipt_email(mut self, email: impl Into<String>) -> Self {
        self.receipt_email = Some(email.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}
