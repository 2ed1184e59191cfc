//! # Payment Container
//!
//! Builds one gateway and one plugin per configured instance and exposes
//! them by service id, plus the plugin registry the workflow runs on.

use crate::config::{
    gateway_alias, gateway_service_id, plugin_alias, plugin_service_id, BundleConfig,
    DEFAULT_INSTANCE,
};
use pay_core::{BoxedPaymentPlugin, PaymentResult, PluginController, PluginRegistry};
use pay_stripe::{plugin_for, BoxedStripeGateway, StripeConfig};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Creates the gateway client for an instance
pub trait GatewayFactory: Send + Sync {
    fn create(&self, config: &StripeConfig) -> PaymentResult<BoxedStripeGateway>;
}

impl<F> GatewayFactory for F
where
    F: Fn(&StripeConfig) -> PaymentResult<BoxedStripeGateway> + Send + Sync,
{
    fn create(&self, config: &StripeConfig) -> PaymentResult<BoxedStripeGateway> {
        self(config)
    }
}

/// Services registered by the bundle
#[derive(Clone, Default)]
pub struct PaymentContainer {
    gateways: BTreeMap<String, BoxedStripeGateway>,
    plugins: BTreeMap<String, BoxedPaymentPlugin>,
    aliases: BTreeMap<String, String>,
    registry: PluginRegistry,
    form_types: Vec<String>,
}

impl PaymentContainer {
    /// Validate the configuration and register every instance
    pub fn load(config: &BundleConfig, factory: &dyn GatewayFactory) -> PaymentResult<Self> {
        config.validate()?;

        let mut container = Self::default();

        for (instance, stripe) in config.instances() {
            let gateway = factory.create(&stripe)?;
            let plugin = plugin_for(&stripe, gateway.clone());

            debug!(
                instance = %instance,
                processes_type = %stripe.processes_type,
                flow = %stripe.flow,
                "registering stripe instance"
            );

            container.gateways.insert(gateway_service_id(&instance), gateway);
            container
                .plugins
                .insert(plugin_service_id(&instance), plugin.clone());
            container.registry.register(instance, plugin);
        }

        if config.has_default_instance() {
            container
                .aliases
                .insert(gateway_alias(), gateway_service_id(DEFAULT_INSTANCE));
            container
                .aliases
                .insert(plugin_alias(), plugin_service_id(DEFAULT_INSTANCE));
        }

        container.form_types = config.method_form_types();

        info!(
            "Stripe bundle loaded: {} instance(s), form types {:?}",
            container.registry.len(),
            container.form_types
        );

        Ok(container)
    }

    fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.aliases.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Gateway by service id or alias
    pub fn gateway(&self, id: &str) -> Option<&BoxedStripeGateway> {
        self.gateways.get(self.resolve(id))
    }

    /// Plugin by service id or alias
    pub fn plugin(&self, id: &str) -> Option<&BoxedPaymentPlugin> {
        self.plugins.get(self.resolve(id))
    }

    pub fn has(&self, id: &str) -> bool {
        let id = self.resolve(id);
        self.gateways.contains_key(id) || self.plugins.contains_key(id)
    }

    /// All concrete service ids, sorted
    pub fn service_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .gateways
            .keys()
            .chain(self.plugins.keys())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Workflow controller over the registered plugins
    pub fn controller(&self) -> PluginController {
        PluginController::new(self.registry.clone())
    }

    pub fn form_types(&self) -> &[String] {
        &self.form_types
    }
}
