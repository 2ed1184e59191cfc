//! # Bundle Configuration
//!
//! Declarative configuration of the Stripe bundle.
//!
//! ```toml
//! api_key = "sk_test_..."            # optional, registers the "default" instance
//! processes_type = "stripe_checkout"
//! type = "checkout"                  # or "payment_intents"
//! logger = true
//! methods = ["checkout"]
//!
//! [instances.eu]
//! api_key = "sk_live_..."
//! processes_type = "stripe_eu"
//! type = "payment_intents"
//! ```

use pay_core::{PaymentError, PaymentResult};
use pay_stripe::{CheckoutFlow, StripeConfig, DEFAULT_PROCESSES_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Instance registered from the top-level `api_key`
pub const DEFAULT_INSTANCE: &str = "default";

/// Payment methods a form type can be registered for
pub const SUPPORTED_METHODS: &[&str] = &["checkout"];

const SERVICE_PREFIX: &str = "payment_stripe";

/// Service id of an instance's gateway
pub fn gateway_service_id(instance: &str) -> String {
    format!("{}.gateway.{}", SERVICE_PREFIX, instance)
}

/// Service id of an instance's plugin
pub fn plugin_service_id(instance: &str) -> String {
    format!("{}.plugin.checkout.{}", SERVICE_PREFIX, instance)
}

/// Alias pointing at the default gateway
pub fn gateway_alias() -> String {
    format!("{}.gateway", SERVICE_PREFIX)
}

/// Alias pointing at the default plugin
pub fn plugin_alias() -> String {
    format!("{}.plugin.checkout", SERVICE_PREFIX)
}

/// A named plugin instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    pub api_key: String,
    pub processes_type: String,
    #[serde(rename = "type", default)]
    pub flow: CheckoutFlow,
}

/// Root bundle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_processes_type")]
    pub processes_type: String,

    #[serde(rename = "type", default)]
    pub flow: CheckoutFlow,

    /// Log gateway payloads from every plugin
    #[serde(default = "default_true")]
    pub logger: bool,

    #[serde(default)]
    pub instances: BTreeMap<String, InstanceConfig>,

    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_processes_type() -> String {
    DEFAULT_PROCESSES_TYPE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_methods() -> Vec<String> {
    SUPPORTED_METHODS.iter().map(|m| m.to_string()).collect()
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            processes_type: default_processes_type(),
            flow: CheckoutFlow::default(),
            logger: true,
            instances: BTreeMap::new(),
            methods: default_methods(),
        }
    }
}

/// What the bundle registers for one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub instance: String,
    pub gateway_service: String,
    pub plugin_service: String,
    pub processes_type: String,
    pub flow: CheckoutFlow,
    pub mode: &'static str,
    pub logging: bool,
}

impl BundleConfig {
    /// Parse and validate TOML
    pub fn from_toml_str(content: &str) -> PaymentResult<Self> {
        let config: BundleConfig = toml::from_str(content)
            .map_err(|e| PaymentError::Configuration(format!("invalid bundle config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> PaymentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaymentError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Single default instance from `STRIPE_*` environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let stripe = StripeConfig::from_env()?;
        let config = Self {
            api_key: Some(stripe.api_key),
            processes_type: stripe.processes_type,
            flow: stripe.flow,
            logger: stripe.logging,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PaymentResult<()> {
        for method in &self.methods {
            if !SUPPORTED_METHODS.contains(&method.as_str()) {
                return Err(PaymentError::Configuration(format!(
                    "{} is not a valid method.",
                    method
                )));
            }
        }

        if self.api_key.is_some() && self.instances.contains_key(DEFAULT_INSTANCE) {
            return Err(PaymentError::Configuration(format!(
                "instance \"{}\" clashes with the top-level api_key",
                DEFAULT_INSTANCE
            )));
        }

        for (instance, stripe) in self.instances() {
            stripe.validate().map_err(|e| match e {
                PaymentError::Configuration(msg) => {
                    PaymentError::Configuration(format!("instances.{}: {}", instance, msg))
                }
                other => other,
            })?;
        }

        Ok(())
    }

    /// Effective instances: the default one first, then named instances
    /// sorted by name.
    pub fn instances(&self) -> Vec<(String, StripeConfig)> {
        let default = self.api_key.as_ref().map(|api_key| {
            let stripe = StripeConfig::new(api_key.clone(), self.processes_type.clone())
                .with_flow(self.flow)
                .with_logging(self.logger);
            (DEFAULT_INSTANCE.to_string(), stripe)
        });

        let named = self.instances.iter().map(|(name, instance)| {
            let stripe = StripeConfig::new(instance.api_key.clone(), instance.processes_type.clone())
                .with_flow(instance.flow)
                .with_logging(self.logger);
            (name.clone(), stripe)
        });

        default.into_iter().chain(named).collect()
    }

    /// Whether the default instance (and its aliases) is registered
    pub fn has_default_instance(&self) -> bool {
        self.api_key.is_some()
    }

    /// Form type names registered for the configured methods
    pub fn method_form_types(&self) -> Vec<String> {
        self.methods.iter().map(|m| format!("stripe_{}", m)).collect()
    }

    /// Describe what `PaymentContainer::load` would register
    pub fn registrations(&self) -> Vec<Registration> {
        self.instances()
            .into_iter()
            .map(|(instance, stripe)| Registration {
                gateway_service: gateway_service_id(&instance),
                plugin_service: plugin_service_id(&instance),
                processes_type: stripe.processes_type.clone(),
                flow: stripe.flow,
                mode: if stripe.is_live_mode() {
                    "live"
                } else if stripe.is_test_mode() {
                    "test"
                } else {
                    "unknown"
                },
                logging: stripe.logging,
                instance,
            })
            .collect()
    }
}
