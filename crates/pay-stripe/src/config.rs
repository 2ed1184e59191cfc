//! # Stripe Configuration
//!
//! Settings for one Stripe plugin instance: which API key its gateway uses,
//! which payment method name it processes and which checkout flow it runs.

use pay_core::PaymentError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default payment method name handled by a plugin
pub const DEFAULT_PROCESSES_TYPE: &str = "stripe_checkout";

/// Which Stripe API a plugin instance drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutFlow {
    /// Legacy Charges API, settles immediately or fails
    Checkout,
    /// Payment Intents API, may require a follow-up user action
    PaymentIntents,
}

impl CheckoutFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutFlow::Checkout => "checkout",
            CheckoutFlow::PaymentIntents => "payment_intents",
        }
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        CheckoutFlow::Checkout
    }
}

impl FromStr for CheckoutFlow {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkout" => Ok(CheckoutFlow::Checkout),
            "payment_intents" => Ok(CheckoutFlow::PaymentIntents),
            other => Err(PaymentError::Configuration(format!(
                "unknown checkout flow \"{}\" (expected checkout or payment_intents)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stripe plugin instance configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub api_key: String,

    /// Payment method name this instance processes
    pub processes_type: String,

    /// Charges or payment intents
    pub flow: CheckoutFlow,

    /// Log request/response payloads
    pub logging: bool,
}

impl StripeConfig {
    /// Create config with explicit values
    pub fn new(api_key: impl Into<String>, processes_type: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            processes_type: processes_type.into(),
            flow: CheckoutFlow::Checkout,
            logging: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `STRIPE_API_KEY` (required)
    /// - `STRIPE_PROCESSES_TYPE` (default `stripe_checkout`)
    /// - `STRIPE_FLOW` (`checkout` or `payment_intents`, default `checkout`)
    /// - `STRIPE_LOGGER` (`true`/`false`, default `true`)
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_key = env::var("STRIPE_API_KEY")
            .map_err(|_| PaymentError::Configuration("STRIPE_API_KEY not set".to_string()))?;

        let processes_type = env::var("STRIPE_PROCESSES_TYPE")
            .unwrap_or_else(|_| DEFAULT_PROCESSES_TYPE.to_string());

        let flow = match env::var("STRIPE_FLOW") {
            Ok(flow) => flow.parse()?,
            Err(_) => CheckoutFlow::default(),
        };

        let logging = match env::var("STRIPE_LOGGER") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                PaymentError::Configuration(format!("STRIPE_LOGGER must be a boolean, got {}", value))
            })?,
            Err(_) => true,
        };

        let config = Self {
            api_key,
            processes_type,
            flow,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject empty api keys and method names
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.api_key.trim().is_empty() {
            return Err(PaymentError::Configuration(
                "api_key cannot be empty".to_string(),
            ));
        }
        if self.processes_type.trim().is_empty() {
            return Err(PaymentError::Configuration(
                "processes_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.api_key.starts_with("sk_live_")
    }

    /// Builder: set the checkout flow
    pub fn with_flow(mut self, flow: CheckoutFlow) -> Self {
        self.flow = flow;
        self
    }

    /// Builder: enable or disable payload logging
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
