//! # Stripe Gateway Boundary
//!
//! The plugins talk to Stripe through `StripeGateway`. Implementations own
//! the HTTP exchange, retries and idempotency keys; the plugins only build
//! the outbound parameters and read the returned payload.

use async_trait::async_trait;
use pay_core::{PaymentError, PaymentResult};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Client for the Stripe charge / payment-intents API
#[async_trait]
pub trait StripeGateway: Send + Sync {
    /// Create a charge or payment intent
    async fn purchase(&self, request: &PurchaseRequest) -> PaymentResult<GatewayResponse>;

    /// Confirm an existing payment intent
    async fn confirm(&self, request: &ConfirmRequest) -> PaymentResult<GatewayResponse> {
        let _ = request;
        Err(PaymentError::InvalidRequest(
            "confirm is only supported by the payment intents gateway".to_string(),
        ))
    }

    /// Refund a charge
    async fn refund(&self, request: &RefundRequest) -> PaymentResult<GatewayResponse>;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedStripeGateway = Arc<dyn StripeGateway>;

// =============================================================================
// Outbound parameters
// =============================================================================

/// Parameters of a purchase call. Optional parameters that are `None` are
/// omitted from the serialized request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRequest {
    /// Amount in major currency units
    pub amount: Decimal,
    pub currency: String,
    /// Always sent, `null` when the caller supplied none
    pub description: Option<String>,
    pub token: String,
    #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,
    #[serde(rename = "returnUrl", skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
    #[serde(rename = "applicationFee", skip_serializing_if = "Option::is_none")]
    pub application_fee: Option<Decimal>,
    #[serde(rename = "stripeVersion", skip_serializing_if = "Option::is_none")]
    pub stripe_version: Option<String>,
    #[serde(
        rename = "connectedStripeAccountHeader",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_stripe_account_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Parameters of a payment-intent confirm call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmRequest {
    #[serde(rename = "paymentIntentReference")]
    pub payment_intent_reference: String,
    #[serde(rename = "stripeVersion", skip_serializing_if = "Option::is_none")]
    pub stripe_version: Option<String>,
    #[serde(
        rename = "connectedStripeAccountHeader",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_stripe_account_header: Option<String>,
}

/// Parameters of a refund call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    pub currency: String,
    /// Charge being refunded
    #[serde(rename = "transactionReference")]
    pub transaction_reference: String,
    #[serde(rename = "refundApplicationFee")]
    pub refund_application_fee: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "stripeVersion", skip_serializing_if = "Option::is_none")]
    pub stripe_version: Option<String>,
    #[serde(
        rename = "connectedStripeAccountHeader",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_stripe_account_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

// =============================================================================
// Response
// =============================================================================

/// Payload returned by the gateway, with its success flags
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    data: Map<String, Value>,
    successful: bool,
    action_required: bool,
    request_data: Option<Value>,
}

impl GatewayResponse {
    /// Build a response with explicit flags
    pub fn new(data: Value, successful: bool, action_required: bool) -> PaymentResult<Self> {
        match data {
            Value::Object(data) => Ok(Self {
                data,
                successful,
                action_required,
                request_data: None,
            }),
            other => Err(PaymentError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Charge API response: successful unless it carries an `error` or
    /// reports `paid: false`
    pub fn charge(data: Value) -> PaymentResult<Self> {
        let successful =
            data.get("error").is_none() && data.get("paid") != Some(&Value::Bool(false));
        Self::new(data, successful, false)
    }

    /// Refund API response: successful unless it carries an `error`
    pub fn refund(data: Value) -> PaymentResult<Self> {
        let successful = data.get("error").is_none();
        Self::new(data, successful, false)
    }

    /// Payment intents API response, flags derived from `status`
    pub fn payment_intent(data: Value) -> PaymentResult<Self> {
        let status = data.get("status").and_then(Value::as_str);
        let successful = data.get("error").is_none()
            && matches!(status, Some("succeeded") | Some("requires_capture"));
        let sdk_action = data
            .get("next_action")
            .and_then(|action| action.get("type"))
            .and_then(Value::as_str)
            == Some("use_stripe_sdk");
        let action_required = status == Some("requires_action") && sdk_action;
        Self::new(data, successful, action_required)
    }

    /// Attach the request that produced this response (for logging)
    pub fn with_request<T: Serialize>(mut self, request: &T) -> Self {
        self.request_data = serde_json::to_value(request).ok();
        self
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }

    /// Whether the front-end SDK must take over (3-D Secure etc.)
    pub fn is_action_required(&self) -> bool {
        self.action_required
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Raw payload as a JSON value
    pub fn raw(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn request_data(&self) -> Option<&Value> {
        self.request_data.as_ref()
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// `error.message`
    pub fn message(&self) -> Option<&str> {
        self.data
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
    }

    /// Charge or refund id
    pub fn transaction_reference(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Payment intent id
    pub fn payment_intent_reference(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn balance_transaction_reference(&self) -> Option<&str> {
        self.data.get("balance_transaction").and_then(expandable_id)
    }

    pub fn application_fee_reference(&self) -> Option<&str> {
        self.data.get("application_fee").and_then(expandable_id)
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.str_field("client_secret")
    }

    /// `amount` in minor currency units
    pub fn amount(&self) -> Option<Decimal> {
        match self.data.get("amount")? {
            Value::Number(n) => n
                .as_i64()
                .map(Decimal::from)
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Raw `error` structure, `null` if absent
    pub fn error(&self) -> Value {
        self.data.get("error").cloned().unwrap_or(Value::Null)
    }

    /// `error.type`
    pub fn error_type(&self) -> Option<&str> {
        self.data
            .get("error")
            .and_then(|error| error.get("type"))
            .and_then(Value::as_str)
    }

    /// First entry of `charges.data`
    pub fn first_charge(&self) -> Option<&Map<String, Value>> {
        self.data
            .get("charges")
            .and_then(|charges| charges.get("data"))
            .and_then(Value::as_array)
            .and_then(|charges| charges.first())
            .and_then(Value::as_object)
    }
}

/// Id of a field Stripe returns either as a bare id or expanded into an
/// object carrying one
pub fn expandable_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) => Some(id),
        Value::Object(object) => object.get("id").and_then(Value::as_str),
        _ => None,
    }
}
