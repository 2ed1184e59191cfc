//! # Payment Plugin Trait
//!
//! Capability set every payment plugin implements, and the registry the
//! workflow uses to pick one.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentPlugin (trait)                    │
//! │  ├── processes(method)                                      │
//! │  ├── approve_and_deposit(snapshot, retry)                   │
//! │  └── credit(snapshot, retry)                                │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!               ┌────────────┴─────────────┐
//!       ┌───────┴───────┐        ┌─────────┴──────────┐
//!       │CheckoutPlugin │        │CheckoutPaymentIntents│
//!       │ (charges)     │        │      Plugin          │
//!       └───────────────┘        └──────────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::transaction::{TransactionOutcome, TransactionSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// A plugin maps a transaction onto a gateway call and the gateway
/// response back onto a transaction outcome.
///
/// `Err` is reserved for failures that prevent classification (invalid
/// input, transport errors); gateway-reported failures come back as
/// `Ok` with a `Disposition::Failed` outcome.
#[async_trait]
pub trait PaymentPlugin: Send + Sync {
    /// Whether this plugin handles the given payment method name
    fn processes(&self, method: &str) -> bool;

    /// Charge (or confirm) the transaction
    async fn approve_and_deposit(
        &self,
        transaction: &TransactionSnapshot,
        retry: bool,
    ) -> PaymentResult<TransactionOutcome>;

    /// Refund the transaction
    async fn credit(
        &self,
        transaction: &TransactionSnapshot,
        retry: bool,
    ) -> PaymentResult<TransactionOutcome>;

    /// Plugin name (for logging)
    fn plugin_name(&self) -> &'static str;
}

/// Type alias for a shared payment plugin (dynamic dispatch)
pub type BoxedPaymentPlugin = Arc<dyn PaymentPlugin>;

/// Plugins keyed by instance name, kept in registration order
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<(String, BoxedPaymentPlugin)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under an instance name, replacing any plugin
    /// already registered under that name.
    pub fn register(&mut self, instance: impl Into<String>, plugin: BoxedPaymentPlugin) {
        let instance = instance.into();
        match self.plugins.iter_mut().find(|(name, _)| *name == instance) {
            Some(entry) => entry.1 = plugin,
            None => self.plugins.push((instance, plugin)),
        }
    }

    /// Register with builder pattern
    pub fn with_plugin(mut self, instance: impl Into<String>, plugin: BoxedPaymentPlugin) -> Self {
        self.register(instance, plugin);
        self
    }

    /// Get a plugin by instance name
    pub fn get(&self, instance: &str) -> Option<&BoxedPaymentPlugin> {
        self.plugins
            .iter()
            .find(|(name, _)| name == instance)
            .map(|(_, plugin)| plugin)
    }

    /// First registered plugin that processes the payment method
    pub fn find(&self, method: &str) -> Option<&BoxedPaymentPlugin> {
        self.plugins
            .iter()
            .find(|(_, plugin)| plugin.processes(method))
            .map(|(_, plugin)| plugin)
    }

    /// Registered instance names, in registration order
    pub fn instances(&self) -> Vec<&str> {
        self.plugins.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
