//! # pay-stripe
//!
//! Stripe plugins for the payment bundle.
//!
//! This crate provides two plugins mapping financial transactions onto
//! Stripe and Stripe responses back onto transaction outcomes:
//!
//! 1. **CheckoutPlugin** - Charges API
//!    - Purchase settles or fails in one call
//!    - Charge id recorded as `stripe_charge_id`
//!
//! 2. **CheckoutPaymentIntentsPlugin** - Payment Intents API
//!    - Purchase may require a user action (3-D Secure)
//!    - Pending transactions are confirmed instead of purchased again
//!    - Charge id recorded as `charge_id`
//!
//! Both talk to Stripe through a `StripeGateway` implementation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::{CheckoutPaymentIntentsPlugin, StripeConfig};
//! use pay_core::{PluginController, PluginRegistry};
//! use std::sync::Arc;
//!
//! let config = StripeConfig::from_env()?;
//! let plugin = CheckoutPaymentIntentsPlugin::from_config(&config, gateway);
//!
//! let controller = PluginController::new(
//!     PluginRegistry::new().with_plugin("default", Arc::new(plugin)),
//! );
//! controller.approve_and_deposit("stripe_checkout", &mut transaction, false).await?;
//! ```

pub mod checkout;
pub mod config;
pub mod gateway;
mod outcome;
pub mod payment_intents;

// Re-exports
pub use checkout::CheckoutPlugin;
pub use config::{CheckoutFlow, StripeConfig, DEFAULT_PROCESSES_TYPE};
pub use gateway::{
    expandable_id, BoxedStripeGateway, ConfirmRequest, GatewayResponse, PurchaseRequest, RefundRequest,
    StripeGateway,
};
pub use payment_intents::CheckoutPaymentIntentsPlugin;

use pay_core::BoxedPaymentPlugin;
use std::sync::Arc;

/// Build the plugin matching the configured flow
pub fn plugin_for(config: &StripeConfig, gateway: BoxedStripeGateway) -> BoxedPaymentPlugin {
    match config.flow {
        CheckoutFlow::Checkout => Arc::new(CheckoutPlugin::from_config(config, gateway)),
        CheckoutFlow::PaymentIntents => {
            Arc::new(CheckoutPaymentIntentsPlugin::from_config(config, gateway))
        }
    }
}
